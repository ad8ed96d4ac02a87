use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use estate_types::models::{
    Activity, Buyer, BuyerFields, ChatMessage, ProfileFields, Property, Role, Sender, Seller,
    SellerFields, UserProfile,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::warn;

const PROFILE_COLUMNS: &str =
    "id, username, email, role, phone, bio, location, company, profile_picture, created_at, updated_at";
const BUYER_COLUMNS: &str =
    "id, name, budget, location, property_type, contact, created_at, updated_at";
const SELLER_COLUMNS: &str =
    "id, name, property_type, location, price, contact, created_at, updated_at";
const CHAT_COLUMNS: &str = "id, session_id, sender, message, intent, automation, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserProfile> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO users (username, email, password, role) VALUES (?1, ?2, ?3, ?4)
                 RETURNING {PROFILE_COLUMNS}"
            );
            let profile = conn.query_row(
                &sql,
                params![username, email, password_hash, role.as_str()],
                profile_from_row,
            )?;
            Ok(profile)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_row(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_row(conn, "email", email))
    }

    pub fn get_user_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, [id], profile_from_row).optional()
        })
    }

    /// Replace every mutable profile column. Returns the number of rows changed.
    pub fn update_user_profile(&self, id: i64, fields: &ProfileFields) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = ?1, email = ?2, phone = ?3, bio = ?4, location = ?5,
                     company = ?6, profile_picture = ?7, updated_at = datetime('now')
                 WHERE id = ?8",
                params![
                    fields.username,
                    fields.email,
                    fields.phone,
                    fields.bio,
                    fields.location,
                    fields.company,
                    fields.profile_picture,
                    id
                ],
            )?;
            Ok(changed)
        })
    }

    // -- Buyers --

    pub fn list_buyers(&self) -> Result<Vec<Buyer>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {BUYER_COLUMNS} FROM buyers ORDER BY created_at DESC, id DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], buyer_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_buyer(&self, id: i64) -> Result<Option<Buyer>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {BUYER_COLUMNS} FROM buyers WHERE id = ?1");
            conn.query_row(&sql, [id], buyer_from_row).optional()
        })
    }

    pub fn create_buyer(&self, fields: &BuyerFields) -> Result<Buyer> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO buyers (name, budget, location, property_type, contact)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {BUYER_COLUMNS}"
            );
            let buyer = conn.query_row(
                &sql,
                params![
                    fields.name,
                    fields.budget,
                    fields.location,
                    fields.property_type,
                    fields.contact
                ],
                buyer_from_row,
            )?;
            Ok(buyer)
        })
    }

    /// Full replace of a buyer's fields. Zero means no buyer has that id.
    pub fn update_buyer(&self, id: i64, fields: &BuyerFields) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE buyers
                 SET name = ?1, budget = ?2, location = ?3, property_type = ?4, contact = ?5,
                     updated_at = datetime('now')
                 WHERE id = ?6",
                params![
                    fields.name,
                    fields.budget,
                    fields.location,
                    fields.property_type,
                    fields.contact,
                    id
                ],
            )?;
            Ok(changed)
        })
    }

    // -- Sellers --

    pub fn list_sellers(&self) -> Result<Vec<Seller>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {SELLER_COLUMNS} FROM sellers ORDER BY created_at DESC, id DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], seller_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_seller(&self, id: i64) -> Result<Option<Seller>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {SELLER_COLUMNS} FROM sellers WHERE id = ?1");
            conn.query_row(&sql, [id], seller_from_row).optional()
        })
    }

    pub fn create_seller(&self, fields: &SellerFields) -> Result<Seller> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO sellers (name, property_type, location, price, contact)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {SELLER_COLUMNS}"
            );
            let seller = conn.query_row(
                &sql,
                params![
                    fields.name,
                    fields.property_type,
                    fields.location,
                    fields.price,
                    fields.contact
                ],
                seller_from_row,
            )?;
            Ok(seller)
        })
    }

    pub fn update_seller(&self, id: i64, fields: &SellerFields) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE sellers
                 SET name = ?1, property_type = ?2, location = ?3, price = ?4, contact = ?5,
                     updated_at = datetime('now')
                 WHERE id = ?6",
                params![
                    fields.name,
                    fields.property_type,
                    fields.location,
                    fields.price,
                    fields.contact,
                    id
                ],
            )?;
            Ok(changed)
        })
    }

    // -- Properties --

    /// All properties with the seller's name and contact joined in.
    pub fn list_properties(&self) -> Result<Vec<Property>> {
        self.with_conn(|conn| {
            // LEFT JOIN keeps properties whose seller is missing
            let mut stmt = conn.prepare(
                "SELECT p.id, p.seller_id, p.title, p.description, p.property_type, p.location,
                        p.price, p.bedrooms, p.bathrooms, p.area_sqft, p.status,
                        s.name, s.contact, p.created_at, p.updated_at
                 FROM properties p
                 LEFT JOIN sellers s ON p.seller_id = s.id
                 ORDER BY p.created_at DESC, p.id DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(Property {
                        id: row.get(0)?,
                        seller_id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        property_type: row.get(4)?,
                        location: row.get(5)?,
                        price: row.get(6)?,
                        bedrooms: row.get(7)?,
                        bathrooms: row.get(8)?,
                        area_sqft: row.get(9)?,
                        status: row.get(10)?,
                        seller_name: row.get(11)?,
                        seller_contact: row.get(12)?,
                        created_at: timestamp_at(row, 13)?,
                        updated_at: timestamp_at(row, 14)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Chat history --

    /// Append one chat row. Rows are never updated or deleted.
    pub fn insert_chat_message(
        &self,
        session_id: &str,
        sender: Sender,
        message: &str,
        intent: Option<&str>,
        automation: Option<&str>,
    ) -> Result<ChatMessage> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO chat_history (session_id, sender, message, intent, automation)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {CHAT_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                params![session_id, sender.as_str(), message, intent, automation],
                chat_from_row,
            )?;
            Ok(row)
        })
    }

    /// Conversation log, oldest first. `None` returns every session.
    pub fn chat_history(&self, session_id: Option<&str>) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let rows = match session_id {
                Some(sid) => {
                    let sql = format!(
                        "SELECT {CHAT_COLUMNS} FROM chat_history
                         WHERE session_id = ?1
                         ORDER BY created_at ASC, id ASC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([sid], chat_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {CHAT_COLUMNS} FROM chat_history ORDER BY created_at ASC, id ASC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([], chat_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    // -- Dashboard --

    pub fn recent_activity(&self, limit: u32) -> Result<Vec<Activity>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                // created_at has one-second resolution; the row id orders
                // entries of the same second
                "SELECT 'buyer' AS type, name, created_at, id FROM buyers
                 UNION ALL
                 SELECT 'seller' AS type, name, created_at, id FROM sellers
                 UNION ALL
                 SELECT 'chat' AS type, sender AS name, created_at, id FROM chat_history
                 ORDER BY created_at DESC, id DESC, type ASC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(Activity {
                        kind: row.get(0)?,
                        name: row.get(1)?,
                        created_at: timestamp_at(row, 2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_row(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS}, password FROM users WHERE {column} = ?1");
    conn.query_row(&sql, [value], |row| {
        Ok(UserRow {
            profile: profile_from_row(row)?,
            password_hash: row.get(11)?,
        })
    })
    .optional()
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let role: String = row.get(3)?;
    Ok(UserProfile {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: role
            .parse::<Role>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        phone: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        company: row.get(7)?,
        profile_picture: row.get(8)?,
        created_at: timestamp_at(row, 9)?,
        updated_at: timestamp_at(row, 10)?,
    })
}

fn buyer_from_row(row: &Row<'_>) -> rusqlite::Result<Buyer> {
    Ok(Buyer {
        id: row.get(0)?,
        name: row.get(1)?,
        budget: row.get(2)?,
        location: row.get(3)?,
        property_type: row.get(4)?,
        contact: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
        updated_at: timestamp_at(row, 7)?,
    })
}

fn seller_from_row(row: &Row<'_>) -> rusqlite::Result<Seller> {
    Ok(Seller {
        id: row.get(0)?,
        name: row.get(1)?,
        property_type: row.get(2)?,
        location: row.get(3)?,
        price: row.get(4)?,
        contact: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
        updated_at: timestamp_at(row, 7)?,
    })
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let sender: String = row.get(2)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sender: sender
            .parse::<Sender>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        message: row.get(3)?,
        intent: row.get(4)?,
        automation: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
    })
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    Ok(parse_timestamp(&raw))
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, accepting RFC 3339 as well.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
