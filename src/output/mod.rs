//! Output module for reports
//!
//! This module handles:
//! - Composing the weekly/monthly digest of published books
//! - Loading and printing catalog statistics

mod digest;
pub mod stats;

pub use digest::{compose_digest, format_digest, write_digest, DateWindow, Digest};
pub use stats::{format_statistics, load_statistics, print_statistics, CatalogStatistics};
