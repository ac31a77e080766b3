//! HTML field extraction for catalog pages
//!
//! This module turns catalog HTML into plain field strings:
//! - listing pages into ordered [`RawBookSummary`] entries
//! - detail pages into a description and a label → value table
//!
//! Extraction is tolerant: a missing element yields an absent field, never
//! an error.

use crate::catalog::RawBookSummary;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Raw content of a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDetail {
    /// Description block text, empty when the page has none
    pub description: String,

    /// Feature table rows, keyed by their trimmed label
    pub fields: HashMap<String, String>,
}

/// Pure HTML → fields extraction
pub trait FieldExtractor: Send + Sync {
    /// Extracts the book entries of a listing page in document order
    fn extract_listing(&self, html: &str) -> Vec<RawBookSummary>;

    /// Extracts the description and labeled fields of a detail page
    fn extract_detail(&self, html: &str) -> RawDetail;
}

/// [`FieldExtractor`] for the catalog's product-card markup
///
/// # Listing Markup
///
/// | Field | Selector |
/// |-------|----------|
/// | entry | `article.card-product` |
/// | title, detail URL | `.card-product__title a` |
/// | cover | `.card-product__media img[src]` |
/// | author | `.card-product__author` |
/// | publisher | `.card-product__edition` |
///
/// # Detail Markup
///
/// | Field | Selector |
/// |-------|----------|
/// | description | `article.product-description` |
/// | feature rows | `article.product-features table tr` (`th` label, `td` value) |
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    base_url: Url,
}

impl HtmlExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        // Protocol-relative links, mostly image CDN sources
        if href.starts_with("//") {
            return Url::parse(&format!("https:{}", href))
                .ok()
                .map(|url| url.to_string());
        }

        self.base_url.join(href).ok().map(|url| url.to_string())
    }
}

impl FieldExtractor for HtmlExtractor {
    fn extract_listing(&self, html: &str) -> Vec<RawBookSummary> {
        let document = Html::parse_document(html);

        let (Ok(card), Ok(title), Ok(media), Ok(author), Ok(edition)) = (
            Selector::parse("article.card-product"),
            Selector::parse(".card-product__title a"),
            Selector::parse(".card-product__media img"),
            Selector::parse(".card-product__author"),
            Selector::parse(".card-product__edition"),
        ) else {
            return Vec::new();
        };

        document
            .select(&card)
            .map(|entry| {
                let title_link = entry.select(&title).next();

                RawBookSummary {
                    title: title_link.and_then(trimmed_text),
                    author_name: entry.select(&author).next().and_then(trimmed_text),
                    publisher: entry.select(&edition).next().and_then(trimmed_text),
                    detail_url: title_link
                        .and_then(|link| link.value().attr("href"))
                        .and_then(|href| self.resolve(href)),
                    cover_image_url: entry
                        .select(&media)
                        .next()
                        .and_then(|img| img.value().attr("src"))
                        .and_then(|src| self.resolve(src)),
                }
            })
            .collect()
    }

    fn extract_detail(&self, html: &str) -> RawDetail {
        let document = Html::parse_document(html);
        let mut detail = RawDetail::default();

        if let Ok(description) = Selector::parse("article.product-description") {
            if let Some(element) = document.select(&description).next() {
                detail.description = joined_text(element, "\n");
            }
        }

        let (Ok(row), Ok(th), Ok(td)) = (
            Selector::parse("article.product-features table tr"),
            Selector::parse("th"),
            Selector::parse("td"),
        ) else {
            return detail;
        };

        for element in document.select(&row) {
            if let (Some(label), Some(value)) =
                (element.select(&th).next(), element.select(&td).next())
            {
                let label = label.text().collect::<String>().trim().to_string();
                detail.fields.insert(label, joined_text(value, " "));
            }
        }

        detail
    }
}

/// Element text with surrounding whitespace removed, `None` when empty
fn trimmed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Trimmed, non-empty text nodes joined with `separator`
fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
