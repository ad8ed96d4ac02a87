use anyhow::Result;
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::info;

use crate::Database;

const SAMPLE_USERS: &[(&str, &str, &str, &str)] = &[
    ("admin", "admin@realestate.com", "admin123", "admin"),
    ("agent1", "agent1@realestate.com", "agent123", "agent"),
    ("user1", "user1@realestate.com", "user123", "user"),
];

const SAMPLE_BUYERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Rahul Kumar", "50L", "Whitefield", "2BHK", "rahul@email.com"),
    ("Anita Sharma", "80L", "Indiranagar", "3BHK", "anita@email.com"),
    ("Vikram Reddy", "60L", "Marathahalli", "2BHK", "vikram@email.com"),
    ("Priya Patel", "45L", "HSR Layout", "1BHK", "priya@email.com"),
];

const SAMPLE_SELLERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Mr. Sharma", "2BHK", "Whitefield", "45L", "sharma@email.com"),
    ("Priya Nair", "3BHK", "Indiranagar", "85L", "priya@email.com"),
    ("Rajesh Kumar", "2BHK", "Marathahalli", "55L", "rajesh@email.com"),
    ("Sunita Reddy", "1BHK", "HSR Layout", "35L", "sunita@email.com"),
];

// seller_id values refer to SAMPLE_SELLERS by insertion order
const SAMPLE_PROPERTIES: &[(i64, &str, &str, &str, &str, &str, i64, i64, i64)] = &[
    (1, "Modern 2BHK Apartment", "Spacious 2BHK with modern amenities", "2BHK", "Whitefield", "45L", 2, 2, 1200),
    (2, "Luxury 3BHK Villa", "Premium 3BHK villa with garden", "3BHK", "Indiranagar", "85L", 3, 3, 1800),
    (3, "Cozy 2BHK Flat", "Well-maintained 2BHK in prime location", "2BHK", "Marathahalli", "55L", 2, 2, 1100),
    (4, "Compact 1BHK Studio", "Perfect 1BHK for singles", "1BHK", "HSR Layout", "35L", 1, 1, 650),
];

/// Insert the sample rows into every empty table.
///
/// Each table is checked and filled inside its own `BEGIN IMMEDIATE`
/// transaction, so a second process booting against the same file waits for
/// the first and then sees a non-empty table. A crash mid-table rolls back.
pub fn seed_sample_data<H>(db: &Database, hash_password: H) -> Result<()>
where
    H: Fn(&str) -> Result<String>,
{
    db.with_conn_mut(|conn| {
        seed_table(conn, "users", |conn| {
            for (username, email, password, role) in SAMPLE_USERS {
                let digest = hash_password(password)?;
                conn.execute(
                    "INSERT INTO users (username, email, password, role) VALUES (?1, ?2, ?3, ?4)",
                    params![username, email, digest, role],
                )?;
            }
            Ok(SAMPLE_USERS.len())
        })?;

        seed_table(conn, "buyers", |conn| {
            for (name, budget, location, property_type, contact) in SAMPLE_BUYERS {
                conn.execute(
                    "INSERT INTO buyers (name, budget, location, property_type, contact)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, budget, location, property_type, contact],
                )?;
            }
            Ok(SAMPLE_BUYERS.len())
        })?;

        seed_table(conn, "sellers", |conn| {
            for (name, property_type, location, price, contact) in SAMPLE_SELLERS {
                conn.execute(
                    "INSERT INTO sellers (name, property_type, location, price, contact)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, property_type, location, price, contact],
                )?;
            }
            Ok(SAMPLE_SELLERS.len())
        })?;

        seed_table(conn, "properties", |conn| {
            for (seller_id, title, description, property_type, location, price, bedrooms, bathrooms, area) in
                SAMPLE_PROPERTIES
            {
                // Skip listings whose seller is gone so the foreign key holds
                let seller_exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sellers WHERE id = ?1)",
                    [seller_id],
                    |row| row.get(0),
                )?;
                let seller_id = seller_exists.then_some(*seller_id);

                conn.execute(
                    "INSERT INTO properties
                        (seller_id, title, description, property_type, location, price,
                         bedrooms, bathrooms, area_sqft)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        seller_id,
                        title,
                        description,
                        property_type,
                        location,
                        price,
                        bedrooms,
                        bathrooms,
                        area
                    ],
                )?;
            }
            Ok(SAMPLE_PROPERTIES.len())
        })?;

        Ok(())
    })
}

fn seed_table<F>(conn: &mut Connection, table: &str, insert: F) -> Result<()>
where
    F: FnOnce(&Connection) -> Result<usize>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let inserted = insert(&tx)?;
    tx.commit()?;

    info!("Sample {} inserted ({} rows)", table, inserted);
    Ok(())
}
