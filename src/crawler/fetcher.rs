//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests against the catalog, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Marking listing requests as incremental fragment requests
//! - Classifying transport failures into [`FetchError`]

use crate::config::HttpConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Header the catalog uses to serve listing pages as bare HTML fragments
pub const FRAGMENT_HEADER: &str = "HX-Request";

/// Kind of catalog page being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// One page of an author's paginated listing
    Listing,

    /// A single book's detail page
    Detail,
}

/// Retrieves raw page bodies from the catalog
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` with the given query parameters and returns the body
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
        kind: PageKind,
    ) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shelf_watch::config::HttpConfig;
/// use shelf_watch::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a page
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Request or connect timeout | `FetchError::Timeout` |
    /// | Non-2xx status | `FetchError::Status` |
    /// | Any other transport failure | `FetchError::Transport` |
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
        kind: PageKind,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url).query(query);
        if kind == PageKind::Listing {
            request = request.header(FRAGMENT_HEADER, "true");
        }

        let response = request.send().await.map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest failure onto the crate's fetch taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl(format!("{}: {}", url, error))
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
