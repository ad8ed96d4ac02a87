use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            role            TEXT NOT NULL DEFAULT 'user',
            phone           TEXT,
            bio             TEXT,
            location        TEXT,
            company         TEXT,
            profile_picture TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS buyers (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            budget          TEXT NOT NULL,
            location        TEXT,
            property_type   TEXT,
            contact         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sellers (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            property_type   TEXT NOT NULL,
            location        TEXT,
            price           TEXT,
            contact         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS properties (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            seller_id       INTEGER REFERENCES sellers(id),
            title           TEXT NOT NULL,
            description     TEXT,
            property_type   TEXT NOT NULL,
            location        TEXT NOT NULL,
            price           TEXT NOT NULL,
            bedrooms        INTEGER,
            bathrooms       INTEGER,
            area_sqft       INTEGER,
            status          TEXT NOT NULL DEFAULT 'available',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS chat_history (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id      TEXT NOT NULL,
            sender          TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
            message         TEXT NOT NULL,
            intent          TEXT,
            automation      TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chat_history_session
            ON chat_history(session_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
