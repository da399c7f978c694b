//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small content hub and drive the full
//! harvest cycle end-to-end through the HTTP driver, plus the in-memory driver
//! for infinite-scroll listings.

use hub_harvester::config::{parse_config, Config};
use hub_harvester::crawler::{run_harvest, CrawlFault, HarvestSession};
use hub_harvester::driver::{HttpDriver, MemoryDriver, PageDriver};
use hub_harvester::output::load_statistics;
use hub_harvester::storage::{RunStatus, SqliteStorage, Storage};
use hub_harvester::{HarvestError, StopReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One `[[category]]` entry: label, URL, optional source type
type CategoryDef<'a> = (&'a str, String, Option<&'a str>);

/// Creates a test configuration through the TOML parser
fn create_test_config(
    categories: &[CategoryDef<'_>],
    max_count: usize,
    scroll_cap: u32,
    output_dir: &std::path::Path,
) -> Config {
    let mut toml = format!(
        r#"
[crawler]
source-type = "native"
scroll-cap = {}
max-count = {}
settle-ms = 10
element-timeout-ms = 200
poll-interval-ms = 5

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{}"
summary-path = "{}"
"#,
        scroll_cap,
        max_count,
        output_dir.join("harvest.db").display(),
        output_dir.join("summary.md").display(),
    );

    for (label, url, source_type) in categories {
        toml.push_str(&format!("\n[[category]]\nlabel = \"{}\"\nurl = \"{}\"\n", label, url));
        if let Some(source_type) = source_type {
            toml.push_str(&format!("source-type = \"{}\"\n", source_type));
        }
    }

    parse_config(&toml).expect("test config should be valid")
}

fn listing_html(items: &[(&str, &str)]) -> String {
    let entries: String = items
        .iter()
        .map(|(href, label)| {
            format!(
                r#"<li class="card-products"><a href="{}">{}</a></li>"#,
                href, label
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="onetrust-banner-sdk">We use cookies</div><ul>{}</ul></body></html>"#,
        entries
    )
}

fn detail_html(title: &str, date: &str, body: &str, download: Option<&str>) -> String {
    let download = download
        .map(|href| format!(r#"<a class="download-link" href="{}">Download</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <h1>{}</h1>
        <time>{}</time>
        <div class="entry-content"><p>{}</p></div>
        {}
        </body></html>"#,
        title, date, body, download
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a news listing whose stories are given newest first
async fn mount_news(server: &MockServer, stories: &[usize]) {
    let hrefs: Vec<String> = stories.iter().map(|n| format!("/news/story-{}/", n)).collect();
    let labels: Vec<String> = stories.iter().map(|n| format!("Story {}", n)).collect();
    let items: Vec<(&str, &str)> = hrefs
        .iter()
        .zip(labels.iter())
        .map(|(h, l)| (h.as_str(), l.as_str()))
        .collect();
    mount_page(server, "/news/", listing_html(&items)).await;

    for n in stories {
        mount_page(
            server,
            &format!("/news/story-{}/", n),
            detail_html(
                &format!("Story {}", n),
                &format!("March {}, 2024", n),
                &format!("Text of story {}", n),
                None,
            ),
        )
        .await;
    }
}

fn http_driver(config: &Config) -> HttpDriver {
    HttpDriver::from_user_agent(&config.user_agent).expect("Failed to build client")
}

#[tokio::test]
async fn test_http_harvest_native_category() {
    let server = MockServer::start().await;
    mount_news(&server, &[3, 2, 1]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[("News", format!("{}/news/", server.uri()), None)],
        10,
        5,
        dir.path(),
    );
    let mut driver = http_driver(&config);

    let outcome = run_harvest(&mut driver, &config, None).await;

    assert!(outcome.fatal.is_none());
    assert!(outcome.faults.is_empty());
    assert_eq!(outcome.stop, Some(StopReason::Exhausted));

    let titles: Vec<&str> = outcome.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Story 3", "Story 2", "Story 1"]);

    let first = &outcome.documents[0];
    assert_eq!(first.text.as_deref(), Some("Text of story 3"));
    assert!(first.abstract_text.is_none());
    assert_eq!(first.web_link, format!("{}/news/story-3/", server.uri()));
    assert_eq!(first.category(), Some("News"));
    assert_eq!(
        first.pub_date.map(|d| d.format("%Y-%m-%d").to_string()),
        Some("2024-03-03".to_string())
    );

    assert_eq!(driver.open_contexts(), 1);
}

#[tokio::test]
async fn test_http_file_category() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/reports/",
        listing_html(&[("/reports/annual/", "Annual"), ("/reports/brief/", "Brief")]),
    )
    .await;
    mount_page(
        &server,
        "/reports/annual/",
        detail_html("Annual Report", "2024-01-15", "The year in review.", Some("/files/annual.pdf")),
    )
    .await;
    mount_page(
        &server,
        "/reports/brief/",
        detail_html("Policy Brief", "2024-01-10", "Short and inline.", None),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[("Reports", format!("{}/reports/", server.uri()), Some("file"))],
        10,
        5,
        dir.path(),
    );
    let mut driver = http_driver(&config);

    let outcome = run_harvest(&mut driver, &config, None).await;
    assert_eq!(outcome.documents.len(), 2);

    let annual = &outcome.documents[0];
    assert!(annual.text.is_none());
    assert_eq!(annual.abstract_text.as_deref(), Some("The year in review."));
    assert_eq!(annual.web_link, format!("{}/files/annual.pdf", server.uri()));
    assert_eq!(
        annual.source_detail_link(),
        Some(format!("{}/reports/annual/", server.uri()).as_str())
    );

    // No download control: extracted like a native page
    let brief = &outcome.documents[1];
    assert!(brief.abstract_text.is_none());
    assert_eq!(brief.text.as_deref(), Some("Short and inline."));
    assert_eq!(brief.web_link, format!("{}/reports/brief/", server.uri()));
}

#[tokio::test]
async fn test_http_broken_category_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_news(&server, &[1]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[
            ("Events", format!("{}/events/", server.uri()), None),
            ("News", format!("{}/news/", server.uri()), None),
        ],
        10,
        5,
        dir.path(),
    );
    let mut driver = http_driver(&config);

    let outcome = run_harvest(&mut driver, &config, None).await;

    assert_eq!(outcome.documents.len(), 1);
    assert_eq!(outcome.faults.len(), 1);
    assert_eq!(outcome.faults[0].category, "Events");
    assert!(matches!(outcome.faults[0].fault, CrawlFault::Driver { .. }));
    assert_eq!(outcome.stop, Some(StopReason::Exhausted));
}

#[tokio::test]
async fn test_http_unreadable_body_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(b"not gzip at all".to_vec()),
        )
        .mount(&server)
        .await;
    mount_news(&server, &[1]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[
            ("Events", format!("{}/events/", server.uri()), None),
            ("News", format!("{}/news/", server.uri()), None),
        ],
        10,
        5,
        dir.path(),
    );
    let mut driver = http_driver(&config);

    let outcome = run_harvest(&mut driver, &config, None).await;

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.documents.len(), 1);
    assert_eq!(outcome.faults.len(), 1);
    assert_eq!(outcome.faults[0].category, "Events");
    assert!(matches!(outcome.faults[0].fault, CrawlFault::Driver { .. }));
}

#[tokio::test]
async fn test_persisted_incremental_harvest() {
    let server = MockServer::start().await;
    mount_news(&server, &[3, 2, 1]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[("News", format!("{}/news/", server.uri()), None)],
        10,
        5,
        dir.path(),
    );

    let mut driver = http_driver(&config);
    let mut session = HarvestSession::open(config.clone(), "hash-1", false).unwrap();
    let first = session.run(&mut driver).await.unwrap();
    assert_eq!(first.outcome.documents.len(), 3);

    // Two stories are published on top of the listing
    server.reset().await;
    mount_news(&server, &[5, 4, 3, 2, 1]).await;

    let mut session = HarvestSession::open(config.clone(), "hash-1", false).unwrap();
    let second = session.run(&mut driver).await.unwrap();

    let titles: Vec<&str> = second.outcome.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Story 5", "Story 4"]);
    assert_eq!(second.outcome.stop, Some(StopReason::Boundary));

    let storage = SqliteStorage::new(&dir.path().join("harvest.db")).unwrap();
    let run = storage.get_run(second.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stop_reason, Some(StopReason::Boundary));

    let stats = load_statistics(&storage).unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_documents, 5);

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("Story 5"));
    assert!(summary.contains("- **Stop Reason**: boundary"));

    // A fresh run ignores the boundary
    let mut session = HarvestSession::open(config, "hash-1", true).unwrap();
    let fresh = session.run(&mut driver).await.unwrap();
    assert_eq!(fresh.outcome.documents.len(), 5);
}

/// Infinite-scroll hub: `n` items under `/a/`, revealed `batch` per scroll
fn memory_hub(n: usize, batch: usize) -> MemoryDriver {
    let items = (0..n)
        .map(|i| {
            format!(
                r#"<li class="card-products"><a href="/a/{}/">Item {}</a></li>"#,
                i, i
            )
        })
        .collect();
    let mut driver = MemoryDriver::new().with_listing("https://hub.example/a/", items, batch);
    for i in 0..n {
        driver = driver.with_page(
            format!("https://hub.example/a/{}/", i),
            detail_html(&format!("Item {}", i), "2024-02-01", &format!("Body {}", i), None),
        );
    }
    driver
}

#[tokio::test]
async fn test_capacity_stop_with_zero_scroll_cap() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[("A", "https://hub.example/a/".to_string(), None)],
        2,
        0,
        dir.path(),
    );
    let mut driver = memory_hub(10, 3);

    let outcome = run_harvest(&mut driver, &config, None).await;

    assert_eq!(outcome.documents.len(), 2);
    assert!(outcome.documents.iter().all(|d| d.category() == Some("A")));
    assert_eq!(outcome.stop, Some(StopReason::Capacity));
    assert_eq!(driver.scroll_count(), 0);
}

#[tokio::test]
async fn test_boundary_matching_third_item() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &[("A", "https://hub.example/a/".to_string(), None)],
        100,
        10,
        dir.path(),
    );
    let mut driver = memory_hub(5, 2);

    let previous = run_harvest(&mut driver, &config, None).await;
    assert_eq!(previous.documents.len(), 5);

    let outcome = run_harvest(&mut driver, &config, Some(&previous.documents[2])).await;

    assert!(outcome.fatal.is_none());
    assert_eq!(outcome.stop, Some(StopReason::Boundary));
    let titles: Vec<&str> = outcome.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Item 0", "Item 1"]);
}

#[tokio::test]
async fn test_fatal_failure_keeps_contexts_balanced() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(
        &[("A", "https://hub.example/a/".to_string(), None)],
        100,
        10,
        dir.path(),
    );
    config.selectors.date = "time[[".to_string();
    let mut driver = memory_hub(3, 3);
    let before = driver.open_contexts();

    let outcome = run_harvest(&mut driver, &config, None).await;

    assert!(matches!(outcome.fatal, Some(HarvestError::Session(_))));
    assert!(outcome.stop.is_none());
    assert!(outcome.documents.is_empty());
    assert_eq!(driver.open_contexts(), before);
}
