//! Storage module for persisting the harvested catalog
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Author registration
//! - Book insertion with detail-URL deduplication
//! - Publication-date window queries for the digest
//! - Refresh run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{IngestionStore, StorageError, StorageResult};

use crate::ShelfError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ShelfError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ShelfError> {
    SqliteStorage::new(path)
}

/// Outcome of a book insertion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The book was not known and has been stored
    Inserted,

    /// A book with the same detail URL already exists
    Duplicate,
}

/// Represents an author in the database
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub id: String,
    pub slug: String,
    pub url: String,
    pub added_at: String,
}

/// Represents a stored book, as read back for reporting
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: i64,
    pub title: Option<String>,
    pub author_id: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub url: String,
    /// ISO date when normalized, otherwise the catalog's own text
    pub publication_date: Option<String>,
    pub pages: u32,
    pub added_at: String,
}

/// Represents a refresh run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub books_added: u64,
}

/// Status of a refresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
