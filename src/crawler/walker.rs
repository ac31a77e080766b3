//! Paginated listing walker
//!
//! Walks an author's catalog listing one page at a time, starting at page 1.
//! The walker only produces entries; whether to ask for the next page is
//! decided by the caller.

use crate::catalog::{Author, RawBookSummary};
use crate::crawler::extractor::FieldExtractor;
use crate::crawler::fetcher::{PageFetcher, PageKind};
use crate::FetchError;

/// Contribution filter selecting the books an author wrote
const CONTRIBUTION_TYPE: &str = "By(author)";

/// One page of an author's listing
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// 1-based page index
    pub number: u32,

    /// Entries in document order
    pub entries: Vec<RawBookSummary>,
}

/// Returns the listing fragment endpoint for a catalog root
pub fn listing_url(base_url: &str) -> String {
    format!("{}/htmx/contributions/", base_url.trim_end_matches('/'))
}

/// Returns the public page of an author
pub fn author_url(base_url: &str, author: &Author) -> String {
    format!(
        "{}/personne/{}/{}/",
        base_url.trim_end_matches('/'),
        author.slug,
        author.id
    )
}

/// Page-by-page producer of an author's listing entries
///
/// The sequence ends on an empty body, on a page with no entries, or after
/// a fetch error; once ended it stays ended.
pub struct ListingWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn FieldExtractor,
    url: String,
    author_id: String,
    next_page: u32,
    finished: bool,
}

impl<'a> ListingWalker<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn FieldExtractor,
        base_url: &str,
        author: &Author,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            url: listing_url(base_url),
            author_id: author.id.clone(),
            next_page: 1,
            finished: false,
        }
    }

    /// Number of pages yielded so far
    pub fn pages_yielded(&self) -> u32 {
        self.next_page - 1
    }

    /// Fetches and extracts the next listing page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(page))` - A page with at least one entry
    /// * `Ok(None)` - Pagination is exhausted
    /// * `Err(FetchError)` - The page could not be retrieved; the walk is over
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>, FetchError> {
        if self.finished {
            return Ok(None);
        }

        let number = self.next_page;
        let query = [
            ("personID", self.author_id.clone()),
            ("contributionType", CONTRIBUTION_TYPE.to_string()),
            ("page", number.to_string()),
        ];

        let body = match self.fetcher.fetch(&self.url, &query, PageKind::Listing).await {
            Ok(body) => body,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if body.trim().is_empty() {
            tracing::debug!("Listing page {} is empty, end of pagination", number);
            self.finished = true;
            return Ok(None);
        }

        let entries = self.extractor.extract_listing(&body);
        if entries.is_empty() {
            tracing::debug!("Listing page {} has no entries, stopping", number);
            self.finished = true;
            return Ok(None);
        }

        self.next_page += 1;
        Ok(Some(ListingPage { number, entries }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extractor::HtmlExtractor;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use url::Url;

    /// Serves listing pages by index and records each requested index
    struct PagedFetcher {
        pages: Vec<Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for PagedFetcher {
        async fn fetch(
            &self,
            url: &str,
            query: &[(&str, String)],
            kind: PageKind,
        ) -> Result<String, FetchError> {
            assert_eq!(kind, PageKind::Listing);
            assert_eq!(url, "https://example.com/htmx/contributions/");
            assert!(query.contains(&("personID", "77".to_string())));

            let page = query
                .iter()
                .find(|(key, _)| *key == "page")
                .map(|(_, value)| value.clone())
                .unwrap();
            self.requested.lock().unwrap().push(page.clone());

            let index: usize = page.parse().unwrap();
            self.pages
                .get(index - 1)
                .cloned()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn card(title: &str) -> String {
        format!(
            r#"<article class="card-product"><h3 class="card-product__title"><a href="/livre/{0}">{0}</a></h3></article>"#,
            title
        )
    }

    async fn walk(pages: Vec<Result<String, FetchError>>) -> (Vec<Vec<String>>, Option<FetchError>, Vec<String>) {
        let fetcher = PagedFetcher {
            pages,
            requested: Mutex::new(Vec::new()),
        };
        let extractor = HtmlExtractor::new(Url::parse("https://example.com").unwrap());
        let author = Author::new("77", "someone");
        let mut walker = ListingWalker::new(&fetcher, &extractor, "https://example.com/", &author);

        let mut titles = Vec::new();
        let mut error = None;
        loop {
            match walker.next_page().await {
                Ok(Some(page)) => {
                    assert_eq!(page.number as usize, titles.len() + 1);
                    titles.push(page.entries.into_iter().filter_map(|e| e.title).collect());
                }
                Ok(None) => break,
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }
        assert!(matches!(walker.next_page().await, Ok(None)));

        let requested = fetcher.requested.into_inner().unwrap();
        (titles, error, requested)
    }

    #[tokio::test]
    async fn test_walk_until_empty_body() {
        let (titles, error, requested) = walk(vec![
            Ok(card("a") + &card("b")),
            Ok(card("c")),
            Ok("   \n".to_string()),
        ])
        .await;

        assert_eq!(titles, vec![vec!["a", "b"], vec!["c"]]);
        assert!(error.is_none());
        assert_eq!(requested, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_walk_stops_on_page_without_entries() {
        let (titles, _, requested) = walk(vec![
            Ok(card("a")),
            Ok("<p>Aucun résultat</p>".to_string()),
            Ok(card("never")),
        ])
        .await;

        assert_eq!(titles, vec![vec!["a"]]);
        assert_eq!(requested, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_walk_ends_after_fetch_error() {
        let (titles, error, requested) = walk(vec![
            Ok(card("a")),
            Err(FetchError::Status {
                url: "https://example.com/htmx/contributions/".to_string(),
                status: 503,
            }),
            Ok(card("never")),
        ])
        .await;

        assert_eq!(titles, vec![vec!["a"]]);
        assert!(matches!(error, Some(FetchError::Status { status: 503, .. })));
        assert_eq!(requested, vec!["1", "2"]);
    }

    #[test]
    fn test_urls() {
        let author = Author::new("1949874", "stephen-king");
        assert_eq!(
            listing_url("https://www.leslibraires.fr/"),
            "https://www.leslibraires.fr/htmx/contributions/"
        );
        assert_eq!(
            author_url("https://www.leslibraires.fr", &author),
            "https://www.leslibraires.fr/personne/stephen-king/1949874/"
        );
    }
}
