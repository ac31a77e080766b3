//! Crawler module for catalog harvesting
//!
//! This module contains the incremental harvesting logic, including:
//! - HTTP fetching of listing and detail pages
//! - HTML field extraction
//! - Detail-page enrichment and normalization
//! - Listing pagination and the stop-at-first-known-book ingestion loop
//! - Refresh orchestration across tracked authors

mod enricher;
mod extractor;
mod fetcher;
mod ingest;
mod refresh;
mod walker;

pub use enricher::{details_from_raw, DetailEnricher, DetailField};
pub use extractor::{FieldExtractor, HtmlExtractor, RawDetail};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher, PageKind, FRAGMENT_HEADER};
pub use ingest::{IngestionLoop, ScanDecision};
pub use refresh::{refresh_all, Harvester};
pub use walker::{author_url, listing_url, ListingPage, ListingWalker};
