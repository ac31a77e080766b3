//! Author refresh orchestration
//!
//! This module runs the ingestion loop over every tracked author and owns
//! the wiring between configuration, HTTP client, extractor and storage.

use crate::catalog::{Author, EnrichedBookRecord};
use crate::config::Config;
use crate::crawler::extractor::{FieldExtractor, HtmlExtractor};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::ingest::IngestionLoop;
use crate::crawler::walker::author_url;
use crate::storage::{open_storage, AuthorRecord, IngestionStore, RunStatus, SqliteStorage};
use crate::ShelfError;
use std::path::Path;
use url::Url;

/// Refreshes every author in turn and collects the books they added
///
/// Authors are processed sequentially, in the given order. A failure while
/// processing one author is logged and that author is skipped; it never
/// aborts the batch.
///
/// # Returns
///
/// All newly stored books, grouped by author in processing order
pub async fn refresh_all(
    fetcher: &dyn PageFetcher,
    extractor: &dyn FieldExtractor,
    store: &mut dyn IngestionStore,
    base_url: &str,
    authors: &[Author],
) -> Vec<EnrichedBookRecord> {
    let mut added = Vec::new();

    for author in authors {
        let result = IngestionLoop::new(fetcher, extractor, &mut *store, base_url)
            .ingest(author)
            .await
            .map_err(|e| ShelfError::Author {
                slug: author.slug.clone(),
                source: Box::new(e),
            });

        match result {
            Ok(books) => added.extend(books),
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        }
    }

    if added.is_empty() {
        tracing::info!("No new books were added");
    } else {
        tracing::info!("{} books added to the database", added.len());
    }

    added
}

/// Configured harvester: the storage handle plus the HTTP stack
pub struct Harvester {
    config: Config,
    config_hash: String,
    storage: SqliteStorage,
    fetcher: HttpFetcher,
    extractor: HtmlExtractor,
}

impl Harvester {
    /// Opens storage and builds the HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded on runs
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to add authors and refresh
    /// * `Err(ShelfError)` - Storage or client initialization failed
    pub fn new(config: Config, config_hash: String) -> Result<Self, ShelfError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Self::with_storage(config, config_hash, storage)
    }

    /// Builds a harvester around an already opened store
    pub fn with_storage(
        config: Config,
        config_hash: String,
        storage: SqliteStorage,
    ) -> Result<Self, ShelfError> {
        let base_url = Url::parse(&config.source.base_url)?;
        let fetcher = HttpFetcher::from_config(&config.http)?;

        Ok(Self {
            config,
            config_hash,
            storage,
            fetcher,
            extractor: HtmlExtractor::new(base_url),
        })
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Registers an author for tracking, if not already tracked
    pub fn add_author(&mut self, author: &Author) -> Result<AuthorRecord, ShelfError> {
        let url = author_url(&self.config.source.base_url, author);
        let (record, created) = self.storage.get_or_create_author(author, &url)?;

        if created {
            tracing::info!("Author {} ({}) added to the database", author.slug, author.id);
        } else {
            tracing::info!("Author {} ({}) is already tracked", author.slug, author.id);
        }

        Ok(record)
    }

    /// Refreshes all tracked authors and records the run
    pub async fn refresh(&mut self) -> Result<Vec<EnrichedBookRecord>, ShelfError> {
        let authors = self.storage.list_authors()?;
        let run_id = self.storage.create_run(&self.config_hash)?;
        tracing::info!("Starting refresh run {} for {} authors", run_id, authors.len());

        let added = refresh_all(
            &self.fetcher,
            &self.extractor,
            &mut self.storage,
            &self.config.source.base_url,
            &authors,
        )
        .await;

        self.storage
            .finish_run(run_id, RunStatus::Completed, added.len() as u64)?;

        Ok(added)
    }
}
