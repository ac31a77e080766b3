//! Catalog data model and field normalization
//!
//! Book records move through two shapes during an ingestion pass:
//! - [`RawBookSummary`], one entry of an author's listing page
//! - [`EnrichedBookRecord`], the summary merged with detail-page fields,
//!   which is what gets persisted
//!
//! The normalization helpers here never fail: input they cannot make sense
//! of is either preserved verbatim or coerced to a neutral default.

use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// A tracked author, registered once and referenced by every ingestion pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Opaque identifier assigned by the catalog site
    pub id: String,

    /// Human-readable key used in catalog URLs
    pub slug: String,
}

impl Author {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
        }
    }
}

/// One entry of a listing page, as extracted from the HTML
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBookSummary {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub publisher: Option<String>,
    /// Absolute URL of the detail page; the deduplication key
    pub detail_url: Option<String>,
    pub cover_image_url: Option<String>,
}

impl RawBookSummary {
    /// Returns the detail URL when the entry carries enough to be ingested
    ///
    /// An entry needs a non-empty title, author name, and detail URL.
    pub fn ingestible_url(&self) -> Option<&str> {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        if present(&self.title) && present(&self.author_name) {
            self.detail_url.as_deref().filter(|url| !url.is_empty())
        } else {
            None
        }
    }
}

/// A publication date as found on a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationDate {
    /// Recognized "day month year" text, normalized to a calendar date
    Parsed(NaiveDate),

    /// Text that did not match the expected pattern, kept as-is
    Unparsed(String),
}

impl PublicationDate {
    /// Returns the calendar date when the source text was recognized
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Parsed(date) => Some(*date),
            Self::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// Fields read from a book's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDetails {
    pub format: Option<String>,
    pub ean13: Option<String>,
    pub isbn: Option<String>,
    pub publication_date: Option<PublicationDate>,
    pub collection: Option<String>,
    /// Always set; absent or unreadable values count as 0
    pub page_count: u32,
    pub language: Option<String>,
    /// Free-text description, empty when the page has none
    pub description: String,
}

/// A listing entry merged with its detail fields, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedBookRecord {
    pub author_id: String,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub publisher: Option<String>,
    pub detail_url: String,
    pub cover_image_url: Option<String>,
    pub details: BookDetails,
}

impl EnrichedBookRecord {
    pub fn new(
        author_id: &str,
        summary: RawBookSummary,
        detail_url: String,
        details: BookDetails,
    ) -> Self {
        Self {
            author_id: author_id.to_string(),
            title: summary.title,
            author_name: summary.author_name,
            publisher: summary.publisher,
            detail_url,
            cover_image_url: summary.cover_image_url,
            details,
        }
    }
}

/// French month names, indexed by ordinal - 1
const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?:er)?\s+(\w+)\s+(\d{4})").unwrap());

static COLLECTION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\s*\d+\s*\)$").unwrap());

/// Maps a French month name to its ordinal (1-12), ignoring case
pub fn month_ordinal(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|index| index as u32 + 1)
}

/// Normalizes a "6 novembre 2024" style date
///
/// Text that does not match, names an unknown month, or describes an
/// impossible day is returned unchanged as [`PublicationDate::Unparsed`].
pub fn normalize_publication_date(raw: &str) -> PublicationDate {
    let parsed = DATE_PATTERN.captures(raw.trim()).and_then(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_ordinal(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });

    match parsed {
        Some(date) => PublicationDate::Parsed(date),
        None => PublicationDate::Unparsed(raw.to_string()),
    }
}

/// Strips a trailing volume number such as "(3)" from a collection name
pub fn clean_collection(raw: &str) -> Option<String> {
    let cleaned = COLLECTION_SUFFIX.replace(raw, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Reads a page count, coercing anything unreadable to 0
///
/// Only the leading number is considered, so "320 pages" yields 320.
/// Digit groups separated by spaces ("1 024") are joined.
pub fn parse_page_count(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || c.is_whitespace())
        .filter(char::is_ascii_digit)
        .collect();

    digits.parse().unwrap_or(0)
}
