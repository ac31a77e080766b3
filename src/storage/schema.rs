//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Shelf-Watch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Tracked authors, registered once
CREATE TABLE IF NOT EXISTS authors (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL,
    url TEXT NOT NULL,
    added_at TEXT NOT NULL
);

-- Every title ever ingested; url is the deduplication key
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    author_id TEXT NOT NULL REFERENCES authors(id),
    author TEXT,
    publisher TEXT,
    url TEXT NOT NULL UNIQUE,
    format TEXT,
    ean13 TEXT,
    isbn TEXT,
    publication_date TEXT,
    published_on TEXT,
    collection TEXT,
    pages INTEGER NOT NULL DEFAULT 0,
    language TEXT,
    description TEXT NOT NULL DEFAULT '',
    picture_link TEXT,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_published_on ON books(published_on);

-- Refresh run history
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    books_added INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
