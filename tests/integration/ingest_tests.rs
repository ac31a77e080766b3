//! Integration tests for catalog ingestion
//!
//! These tests use wiremock to serve a fake catalog and exercise the
//! full refresh cycle against SQLite storage on disk.

use shelf_watch::config::{Config, HttpConfig, OutputConfig, SourceConfig};
use shelf_watch::crawler::{HtmlExtractor, HttpFetcher, PageFetcher, PageKind};
use shelf_watch::output::compose_digest;
use shelf_watch::storage::{IngestionStore, RunStatus, SqliteStorage};
use shelf_watch::{Author, FetchError, Harvester};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
        },
        http: HttpConfig {
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            report_path: None,
        },
    }
}

fn card(slug: &str) -> String {
    format!(
        r#"<article class="card-product">
            <div class="card-product__media"><img src="/covers/{0}.jpg"></div>
            <h3 class="card-product__title"><a href="/livre/{0}/">Title {0}</a></h3>
            <p class="card-product__author">Stephen King</p>
            <p class="card-product__edition">Albin Michel</p>
        </article>"#,
        slug
    )
}

fn listing(slugs: &[&str]) -> String {
    slugs.iter().map(|slug| card(slug)).collect()
}

fn detail_page(published: &str) -> String {
    format!(
        r#"<html><body>
        <article class="product-description"><p>A long story.</p></article>
        <article class="product-features"><table>
            <tr><th>Format</th><td>Broché</td></tr>
            <tr><th>EAN13</th><td>9782226123456</td></tr>
            <tr><th>Date de publication</th><td>{}</td></tr>
            <tr><th>Collection</th><td>Romans ( 12 )</td></tr>
            <tr><th>Nombre de pages</th><td>1 024</td></tr>
            <tr><th>Langue</th><td>Français</td></tr>
        </table></article>
        </body></html>"#,
        published
    )
}

/// Mounts one listing page for an author
async fn mount_listing(server: &MockServer, author_id: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/htmx/contributions/"))
        .and(query_param("personID", author_id))
        .and(query_param("contributionType", "By(author)"))
        .and(query_param("page", page.to_string().as_str()))
        .and(header("HX-Request", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts detail pages for the given slugs
async fn mount_details(server: &MockServer, slugs: &[&str]) {
    for slug in slugs {
        Mock::given(method("GET"))
            .and(path(format!("/livre/{}/", slug)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("6 novembre 2024")))
            .mount(server)
            .await;
    }
}

fn harvester(server: &MockServer, dir: &TempDir) -> Harvester {
    let db_path = dir.path().join("books.db");
    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    let storage = SqliteStorage::new(&db_path).expect("Failed to open storage");
    Harvester::with_storage(config, "test-hash".to_string(), storage)
        .expect("Failed to build harvester")
}

fn stored_urls(harvester: &Harvester, server: &MockServer, slugs: &[&str]) -> Vec<bool> {
    slugs
        .iter()
        .map(|slug| {
            harvester
                .storage()
                .get_book_by_url(&format!("{}/livre/{}/", server.uri(), slug))
                .unwrap()
                .is_some()
        })
        .collect()
}

#[tokio::test]
async fn test_first_refresh_stores_enriched_books() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1949874", 1, listing(&["carrie", "shining"])).await;
    mount_listing(&server, "1949874", 2, listing(&["it"])).await;
    mount_listing(&server, "1949874", 3, String::new()).await;
    mount_details(&server, &["carrie", "shining", "it"]).await;

    let mut harvester = harvester(&server, &dir);
    harvester
        .add_author(&Author::new("1949874", "stephen-king"))
        .unwrap();

    let added = harvester.refresh().await.unwrap();

    let titles: Vec<_> = added.iter().filter_map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["Title carrie", "Title shining", "Title it"]);

    let first = &added[0];
    assert_eq!(first.author_id, "1949874");
    assert_eq!(first.publisher.as_deref(), Some("Albin Michel"));
    assert_eq!(
        first.cover_image_url.as_deref(),
        Some(format!("{}/covers/carrie.jpg", server.uri()).as_str())
    );
    assert_eq!(first.details.format.as_deref(), Some("Broché"));
    assert_eq!(first.details.collection.as_deref(), Some("Romans"));
    assert_eq!(first.details.page_count, 1024);
    assert_eq!(first.details.description, "A long story.");
    assert_eq!(
        first.details.publication_date.as_ref().map(|d| d.to_string()),
        Some("2024-11-06".to_string())
    );

    let stored = harvester
        .storage()
        .get_book_by_url(&format!("{}/livre/carrie/", server.uri()))
        .unwrap()
        .expect("Book should be stored");
    assert_eq!(stored.publication_date.as_deref(), Some("2024-11-06"));
    assert_eq!(stored.pages, 1024);

    let run = harvester.storage().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.books_added, 3);
}

#[tokio::test]
async fn test_second_refresh_adds_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1", 1, listing(&["a", "b"])).await;
    mount_listing(&server, "1", 2, String::new()).await;
    mount_details(&server, &["a", "b"]).await;

    let mut harvester = harvester(&server, &dir);
    harvester.add_author(&Author::new("1", "someone")).unwrap();

    assert_eq!(harvester.refresh().await.unwrap().len(), 2);
    assert!(harvester.refresh().await.unwrap().is_empty());
    assert_eq!(harvester.storage().count_books().unwrap(), 2);
}

#[tokio::test]
async fn test_known_first_page_halts_without_lookahead() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1", 1, listing(&["a", "b"])).await;
    mount_details(&server, &["a", "b"]).await;

    let mut harvester = harvester(&server, &dir);
    harvester.add_author(&Author::new("1", "someone")).unwrap();
    // Without a page 2 mock, the first refresh ends on a 404
    harvester.refresh().await.unwrap();

    server.reset().await;
    mount_listing(&server, "1", 1, listing(&["a", "b"])).await;
    Mock::given(method("GET"))
        .and(path("/htmx/contributions/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["old"])))
        .expect(0)
        .mount(&server)
        .await;

    let added = harvester.refresh().await.unwrap();
    assert!(added.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_new_book_triggers_one_page_of_lookahead() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut harvester = harvester(&server, &dir);
    harvester.add_author(&Author::new("1", "someone")).unwrap();

    // Seed the catalog with the older books
    mount_listing(&server, "1", 1, listing(&["b", "c"])).await;
    mount_listing(&server, "1", 2, listing(&["d"])).await;
    mount_listing(&server, "1", 3, String::new()).await;
    mount_details(&server, &["b", "c", "d"]).await;
    assert_eq!(harvester.refresh().await.unwrap().len(), 3);

    // A new title shifts everything by one
    server.reset().await;
    mount_listing(&server, "1", 1, listing(&["new", "b"])).await;
    mount_listing(&server, "1", 2, listing(&["c", "d"])).await;
    Mock::given(method("GET"))
        .and(path("/htmx/contributions/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(String::new()))
        .expect(0)
        .mount(&server)
        .await;
    mount_details(&server, &["new"]).await;

    let added = harvester.refresh().await.unwrap();
    let titles: Vec<_> = added.iter().filter_map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["Title new"]);
    server.verify().await;
}

#[tokio::test]
async fn test_failing_author_does_not_block_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1", 1, listing(&["first"])).await;
    mount_listing(&server, "1", 2, String::new()).await;
    Mock::given(method("GET"))
        .and(path("/htmx/contributions/"))
        .and(query_param("personID", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(&server, "3", 1, listing(&["third"])).await;
    mount_listing(&server, "3", 2, String::new()).await;
    mount_details(&server, &["first", "third"]).await;

    let mut harvester = harvester(&server, &dir);
    for (id, slug) in [("1", "one"), ("2", "two"), ("3", "three")] {
        harvester.add_author(&Author::new(id, slug)).unwrap();
    }

    let added = harvester.refresh().await.unwrap();

    let authors: Vec<_> = added.iter().map(|r| r.author_id.as_str()).collect();
    assert_eq!(authors, vec!["1", "3"]);
    assert_eq!(
        stored_urls(&harvester, &server, &["first", "third"]),
        vec![true, true]
    );
}

#[tokio::test]
async fn test_missing_detail_page_still_stores_book() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1", 1, listing(&["lost"])).await;
    mount_listing(&server, "1", 2, String::new()).await;

    let mut harvester = harvester(&server, &dir);
    harvester.add_author(&Author::new("1", "someone")).unwrap();

    let added = harvester.refresh().await.unwrap();

    assert_eq!(added.len(), 1);
    assert!(added[0].details.publication_date.is_none());
    assert_eq!(added[0].details.page_count, 0);
    assert_eq!(stored_urls(&harvester, &server, &["lost"]), vec![true]);
}

#[tokio::test]
async fn test_digest_after_refresh() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "1", 1, listing(&["carrie"])).await;
    mount_listing(&server, "1", 2, String::new()).await;
    mount_details(&server, &["carrie"]).await;

    let mut harvester = harvester(&server, &dir);
    harvester.add_author(&Author::new("1", "someone")).unwrap();
    harvester.refresh().await.unwrap();

    let today = chrono::NaiveDate::from_ymd_opt(2024, 11, 8).unwrap();
    let digest = compose_digest(harvester.storage(), today).unwrap();

    assert_eq!(digest.weekly.len(), 1);
    assert!(digest.monthly.is_empty());
}

#[tokio::test]
async fn test_fetcher_maps_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&HttpConfig {
        user_agent: "Mozilla/5.0".to_string(),
        timeout_secs: 1,
        connect_timeout_secs: 1,
    })
    .unwrap();

    let result = fetcher
        .fetch(&format!("{}/slow", server.uri()), &[], PageKind::Detail)
        .await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_fetcher_reports_status_and_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/livre/ok/"))
        .and(header("User-Agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::from_config(&HttpConfig::default()).unwrap();

    let body = fetcher
        .fetch(&format!("{}/livre/ok/", server.uri()), &[], PageKind::Detail)
        .await
        .unwrap();
    assert_eq!(body, "hello");

    let missing = fetcher
        .fetch(&format!("{}/livre/gone/", server.uri()), &[], PageKind::Detail)
        .await;
    assert!(matches!(missing, Err(FetchError::Status { status: 404, .. })));
}

#[test]
fn test_extractor_resolves_against_catalog_root() {
    use shelf_watch::crawler::FieldExtractor;

    let extractor = HtmlExtractor::new(url::Url::parse("https://www.leslibraires.fr").unwrap());
    let entries = extractor.extract_listing(&listing(&["carrie"]));

    assert_eq!(
        entries[0].detail_url.as_deref(),
        Some("https://www.leslibraires.fr/livre/carrie/")
    );
}
