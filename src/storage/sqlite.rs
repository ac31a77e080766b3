//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the IngestionStore trait.

use crate::catalog::{Author, EnrichedBookRecord, PublicationDate};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{IngestionStore, StorageError, StorageResult};
use crate::storage::{AuthorRecord, BookRecord, InsertOutcome, RunRecord, RunStatus};
use crate::ShelfError;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const BOOK_COLUMNS: &str =
    "id, title, author_id, author, publisher, url, publication_date, pages, added_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ShelfError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ShelfError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, ShelfError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn book_from_row(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
        Ok(BookRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            author_id: row.get(2)?,
            author: row.get(3)?,
            publisher: row.get(4)?,
            url: row.get(5)?,
            publication_date: row.get(6)?,
            pages: row.get(7)?,
            added_at: row.get(8)?,
        })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Failed),
            books_added: row.get::<_, i64>(5)? as u64,
        })
    }
}

/// True when the error is a UNIQUE constraint violation
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

impl IngestionStore for SqliteStorage {
    // ===== Author Management =====

    fn get_or_create_author(
        &mut self,
        author: &Author,
        author_url: &str,
    ) -> StorageResult<(AuthorRecord, bool)> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT INTO authors (id, slug, url, added_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO NOTHING",
            params![author.id, author.slug, author_url, now],
        )?;

        let record = self
            .get_author(&author.id)?
            .ok_or_else(|| StorageError::AuthorNotFound(author.id.clone()))?;

        Ok((record, inserted > 0))
    }

    fn get_author(&self, author_id: &str) -> StorageResult<Option<AuthorRecord>> {
        let author = self
            .conn
            .query_row(
                "SELECT id, slug, url, added_at FROM authors WHERE id = ?1",
                params![author_id],
                |row| {
                    Ok(AuthorRecord {
                        id: row.get(0)?,
                        slug: row.get(1)?,
                        url: row.get(2)?,
                        added_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(author)
    }

    fn list_authors(&self) -> StorageResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, slug FROM authors ORDER BY rowid ASC")?;

        let authors = stmt
            .query_map([], |row| {
                Ok(Author {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    // ===== Book Ingestion =====

    fn insert_book(&mut self, record: &EnrichedBookRecord) -> StorageResult<InsertOutcome> {
        let details = &record.details;
        let publication_date = details.publication_date.as_ref().map(PublicationDate::to_string);
        let published_on = details
            .publication_date
            .as_ref()
            .and_then(PublicationDate::date)
            .map(|date| date.format(DATE_FORMAT).to_string());
        let now = Utc::now().to_rfc3339();

        // A single statement, so the UNIQUE check and the write are atomic
        let result = self.conn.execute(
            "INSERT INTO books (
                title, author_id, author, publisher, url,
                format, ean13, isbn, publication_date, published_on,
                collection, pages, language, description, picture_link, added_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.title,
                record.author_id,
                record.author_name,
                record.publisher,
                record.detail_url,
                details.format,
                details.ean13,
                details.isbn,
                publication_date,
                published_on,
                details.collection,
                details.page_count,
                details.language,
                details.description,
                record.cover_image_url,
                now,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn get_book_by_url(&self, url: &str) -> StorageResult<Option<BookRecord>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {} FROM books WHERE url = ?1", BOOK_COLUMNS),
                params![url],
                Self::book_from_row,
            )
            .optional()?;

        Ok(book)
    }

    fn books_in_range(&self, start: NaiveDate, end: NaiveDate) -> StorageResult<Vec<BookRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM books
             WHERE published_on >= ?1 AND published_on <= ?2
             ORDER BY published_on DESC, id ASC",
            BOOK_COLUMNS
        ))?;

        let books = stmt
            .query_map(
                params![
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                Self::book_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        books_added: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, books_added = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, books_added as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }

        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, books_added
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Statistics =====

    fn count_authors(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_books(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
