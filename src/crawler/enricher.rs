//! Detail-page enrichment
//!
//! Fetches a book's detail page and turns its feature table into a
//! normalized [`BookDetails`].

use crate::catalog::{
    clean_collection, normalize_publication_date, parse_page_count, BookDetails,
};
use crate::crawler::extractor::{FieldExtractor, RawDetail};
use crate::crawler::fetcher::{PageFetcher, PageKind};
use crate::FetchError;

/// Feature-table labels the enricher understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Format,
    Ean13,
    Isbn,
    PublicationDate,
    Collection,
    PageCount,
    Language,
}

impl DetailField {
    /// Maps a feature-table label to its field; unknown labels yield `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Format" => Some(Self::Format),
            "EAN13" => Some(Self::Ean13),
            "ISBN" => Some(Self::Isbn),
            "Date de publication" => Some(Self::PublicationDate),
            "Collection" => Some(Self::Collection),
            "Nombre de pages" => Some(Self::PageCount),
            "Langue" => Some(Self::Language),
            _ => None,
        }
    }
}

/// Builds normalized details from an extracted detail page
pub fn details_from_raw(raw: RawDetail) -> BookDetails {
    let mut details = BookDetails {
        description: raw.description,
        ..Default::default()
    };

    for (label, value) in raw.fields {
        let Some(field) = DetailField::from_label(&label) else {
            continue;
        };

        match field {
            DetailField::Format => details.format = Some(value),
            DetailField::Ean13 => details.ean13 = Some(value),
            DetailField::Isbn => details.isbn = Some(value),
            DetailField::PublicationDate => {
                details.publication_date = Some(normalize_publication_date(&value))
            }
            DetailField::Collection => details.collection = clean_collection(&value),
            DetailField::PageCount => details.page_count = parse_page_count(&value),
            DetailField::Language => details.language = Some(value),
        }
    }

    details
}

/// Fetches and normalizes detail pages
pub struct DetailEnricher<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn FieldExtractor,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, extractor: &'a dyn FieldExtractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Fetches `detail_url` and returns its normalized fields
    ///
    /// Only transport failures are reported; every parsing problem is
    /// absorbed by the field normalizers.
    pub async fn enrich(&self, detail_url: &str) -> Result<BookDetails, FetchError> {
        let html = self.fetcher.fetch(detail_url, &[], PageKind::Detail).await?;
        Ok(details_from_raw(self.extractor.extract_detail(&html)))
    }
}
