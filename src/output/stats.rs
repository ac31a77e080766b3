//! Statistics from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::storage::{IngestionStore, RunRecord};
use crate::Result;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Number of tracked authors
    pub authors: u64,

    /// Number of stored books
    pub books: u64,

    /// Most recent refresh run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(ShelfError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn IngestionStore) -> Result<CatalogStatistics> {
    Ok(CatalogStatistics {
        authors: storage.count_authors()?,
        books: storage.count_books()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Formats statistics for the terminal
pub fn format_statistics(stats: &CatalogStatistics) -> String {
    let mut out = String::new();

    out.push_str("=== Catalog Statistics ===\n\n");
    out.push_str(&format!("Tracked authors: {}\n", stats.authors));
    out.push_str(&format!("Stored books: {}\n", stats.books));

    match &stats.latest_run {
        Some(run) => {
            out.push_str(&format!("\nLatest run: #{}\n", run.id));
            out.push_str(&format!("  Status: {}\n", run.status.to_db_string()));
            out.push_str(&format!("  Started: {}\n", run.started_at));
            if let Some(finished) = &run.finished_at {
                out.push_str(&format!("  Finished: {}\n", finished));
            }
            out.push_str(&format!("  Books added: {}\n", run.books_added));
        }
        None => out.push_str("\nNo refresh runs yet\n"),
    }

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CatalogStatistics) {
    print!("{}", format_statistics(stats));
}
