//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::catalog::{Author, EnrichedBookRecord};
use crate::storage::{AuthorRecord, BookRecord, InsertOutcome, RunRecord, RunStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Author not found: {0}")]
    AuthorNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The backend is the sole arbiter of whether a book is new: `insert_book`
/// must be atomic with respect to the uniqueness of `detail_url`, so that
/// of any number of attempts for the same URL exactly one is `Inserted`.
pub trait IngestionStore {
    // ===== Author Management =====

    /// Returns the stored author, registering it first if unknown
    ///
    /// # Returns
    ///
    /// The author row and whether it was created by this call
    fn get_or_create_author(
        &mut self,
        author: &Author,
        author_url: &str,
    ) -> StorageResult<(AuthorRecord, bool)>;

    /// Gets an author by its catalog identifier
    fn get_author(&self, author_id: &str) -> StorageResult<Option<AuthorRecord>>;

    /// Lists every tracked author in registration order
    fn list_authors(&self) -> StorageResult<Vec<Author>>;

    // ===== Book Ingestion =====

    /// Persists a book unless its detail URL is already known
    fn insert_book(&mut self, record: &EnrichedBookRecord) -> StorageResult<InsertOutcome>;

    /// Gets a book by its detail URL
    fn get_book_by_url(&self, url: &str) -> StorageResult<Option<BookRecord>>;

    /// Books whose normalized publication date falls in `start..=end`,
    /// most recent first
    fn books_in_range(&self, start: NaiveDate, end: NaiveDate) -> StorageResult<Vec<BookRecord>>;

    // ===== Run Management =====

    /// Records the start of a refresh run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Closes a run with its final status and the number of books it added
    fn finish_run(&mut self, run_id: i64, status: RunStatus, books_added: u64)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    /// Counts tracked authors
    fn count_authors(&self) -> StorageResult<u64>;

    /// Counts stored books
    fn count_books(&self) -> StorageResult<u64>;
}
