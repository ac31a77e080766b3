//! Incremental ingestion of one author's catalog
//!
//! Listings are newest-first, so the first already-stored book marks the
//! boundary of what previous runs have seen. The loop walks pages in order
//! and stops once a whole page brings nothing new.
//!
//! # Page Decisions
//!
//! | Entries on the page | Decision |
//! |---------------------|----------|
//! | at least one inserted | `Continue` (fetch the next page) |
//! | none inserted, at least one duplicate or store failure | `Halt` |
//! | only skipped entries | previous page's decision (initially `Continue`) |

use crate::catalog::{Author, BookDetails, EnrichedBookRecord, RawBookSummary};
use crate::crawler::enricher::DetailEnricher;
use crate::crawler::extractor::FieldExtractor;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::walker::ListingWalker;
use crate::storage::{IngestionStore, InsertOutcome};
use crate::ShelfError;

/// Whether the loop asks for another listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    Continue,
    Halt,
}

/// What happened to a single listing entry
#[derive(Debug)]
enum EntryOutcome {
    /// Stored as a new book
    Added(EnrichedBookRecord),

    /// Already stored
    Known,

    /// The store rejected it for another reason
    StoreFailed,

    /// Not ingestible (missing title, author, or detail URL)
    Skipped,
}

impl EntryOutcome {
    fn decision(&self) -> Option<ScanDecision> {
        match self {
            Self::Added(_) => Some(ScanDecision::Continue),
            Self::Known | Self::StoreFailed => Some(ScanDecision::Halt),
            Self::Skipped => None,
        }
    }
}

/// Runs the incremental scan for one author at a time
pub struct IngestionLoop<'a, S: IngestionStore + ?Sized> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn FieldExtractor,
    store: &'a mut S,
    base_url: &'a str,
}

impl<'a, S: IngestionStore + ?Sized> IngestionLoop<'a, S> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn FieldExtractor,
        store: &'a mut S,
        base_url: &'a str,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            store,
            base_url,
        }
    }

    /// Ingests the new tail of an author's catalog
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<EnrichedBookRecord>)` - Newly stored books, in listing order
    /// * `Err(ShelfError)` - The first listing page could not be fetched
    ///
    /// A fetch failure on a later page ends the scan early but keeps the
    /// books already stored.
    pub async fn ingest(&mut self, author: &Author) -> Result<Vec<EnrichedBookRecord>, ShelfError> {
        tracing::debug!("Scanning books for author {} ({})", author.slug, author.id);

        let mut walker = ListingWalker::new(self.fetcher, self.extractor, self.base_url, author);
        let enricher = DetailEnricher::new(self.fetcher, self.extractor);

        let mut added = Vec::new();
        let mut scanned = 0usize;
        let mut decision = ScanDecision::Continue;

        loop {
            let page = match walker.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) if walker.pages_yielded() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(
                        "Listing for {} ended early after page {}: {}",
                        author.slug,
                        walker.pages_yielded(),
                        e
                    );
                    break;
                }
            };

            let mut page_decision = None;
            for summary in page.entries {
                scanned += 1;
                let outcome = self.ingest_entry(author, summary, &enricher).await;

                page_decision = match (page_decision, outcome.decision()) {
                    (_, Some(ScanDecision::Continue)) => Some(ScanDecision::Continue),
                    (None, entry_decision) => entry_decision,
                    (current, _) => current,
                };

                if let EntryOutcome::Added(record) = outcome {
                    added.push(record);
                }
            }

            decision = page_decision.unwrap_or(decision);
            if decision == ScanDecision::Halt {
                tracing::debug!(
                    "Page {} for {} brought nothing new, stopping",
                    page.number,
                    author.slug
                );
                break;
            }
        }

        tracing::info!(
            "Author {}: {} books scanned, {} new",
            author.slug,
            scanned,
            added.len()
        );

        Ok(added)
    }

    /// Enriches and persists one listing entry
    async fn ingest_entry(
        &mut self,
        author: &Author,
        summary: RawBookSummary,
        enricher: &DetailEnricher<'_>,
    ) -> EntryOutcome {
        let Some(detail_url) = summary.ingestible_url().map(str::to_string) else {
            tracing::debug!("Skipping listing entry without title or author: {:?}", summary);
            return EntryOutcome::Skipped;
        };

        let details = match enricher.enrich(&detail_url).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("Could not enrich {}: {}", detail_url, e);
                BookDetails::default()
            }
        };

        let record = EnrichedBookRecord::new(&author.id, summary, detail_url, details);

        match self.store.insert_book(&record) {
            Ok(InsertOutcome::Inserted) => {
                tracing::debug!(
                    "New book: {} by {}",
                    record.title.as_deref().unwrap_or_default(),
                    record.author_name.as_deref().unwrap_or_default()
                );
                EntryOutcome::Added(record)
            }
            Ok(InsertOutcome::Duplicate) => EntryOutcome::Known,
            Err(e) => {
                tracing::error!("Error inserting book {}: {}", record.detail_url, e);
                EntryOutcome::StoreFailed
            }
        }
    }
}
