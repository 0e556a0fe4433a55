//! End-to-end tests for the crawl and analysis pipeline
//!
//! These tests use wiremock to stand up a mock site and drive a full
//! run (crawl + analysis) against it.

use sitescope::analyzer::{Analyzer, IssueKind};
use sitescope::config::Config;
use sitescope::run::{process_run, request_run, RequestOutcome, RunRequest};
use sitescope::storage::{RunStatus, SqliteStorage, Storage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.delay_ms = 10; // keep tests fast
    config.crawler.timeout_secs = 10;
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
            title, title, body
        )
        .into_bytes(),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

/// Creates a run for the mock server and drives it to completion
async fn run_analysis(
    storage: &mut SqliteStorage,
    config: &Config,
    server: &MockServer,
    max_pages: u32,
) -> i64 {
    let mut request = RunRequest::new(format!("{}/", server.uri()));
    request.max_pages = max_pages;

    let RequestOutcome::Created(run_id) = request_run(storage, &request).unwrap() else {
        panic!("expected a fresh run");
    };
    process_run(storage, config, run_id).await.unwrap();
    run_id
}

#[tokio::test]
async fn test_depth_limited_crawl_stops_at_max_depth() {
    let server = MockServer::start().await;

    // / -> /a -> /b chain; with max_depth = 1 only / and /a are admitted
    mount_page(
        &server,
        "/",
        "Landing page for the depth test",
        r#"<p>words here</p><a href="/a">a</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/a",
        "First hop page of the chain",
        r#"<p>words here</p><a href="/b">b</a>"#,
    )
    .await;
    mount_page(&server, "/b", "Second hop page of the chain", "<p>x</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(1), &server, 100).await;

    let pages = storage.pages_for_run(run_id).unwrap();
    let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();

    assert_eq!(pages.len(), 2, "expected / and /a only, got {:?}", urls);
    assert!(urls.iter().any(|u| u.ends_with('/')));
    assert!(urls.iter().any(|u| u.ends_with("/a")));
}

#[tokio::test]
async fn test_budget_cutoff_limits_persisted_pages() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", "Hub page linking everywhere", &links).await;
    for i in 0..10 {
        mount_page(
            &server,
            &format!("/page{}", i),
            &format!("Leaf page number {}", i),
            "<p>content</p>",
        )
        .await;
    }

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(5), &server, 3).await;

    assert_eq!(storage.count_pages(run_id).unwrap(), 3);

    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.progress, 100.0);
}

#[tokio::test]
async fn test_no_page_fetched_twice() {
    let server = MockServer::start().await;

    // Every page links back to every other page
    mount_page(
        &server,
        "/",
        "Mutually linked page one",
        r#"<a href="/x">x</a><a href="/y">y</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/x",
        "Mutually linked page two",
        r#"<a href="/">home</a><a href="/y">y</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/y",
        "Mutually linked page three",
        r#"<a href="/">home</a><a href="/x">x</a>"#,
    )
    .await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(5), &server, 100).await;

    // Three unique pages regardless of how many links point at them
    assert_eq!(storage.count_pages(run_id).unwrap(), 3);
}

#[tokio::test]
async fn test_title_length_issue_boundaries() {
    let server = MockServer::start().await;

    let long_title = "x".repeat(80);
    let links = r#"<a href="/short">s</a><a href="/long">l</a><a href="/fine">f</a>"#;
    mount_page(&server, "/", "Hub page for the title length test case", links).await;
    mount_page(&server, "/short", "short ttle", "<p>c</p>").await; // 10 chars
    mount_page(&server, "/long", &long_title, "<p>c</p>").await; // 80 chars
    mount_page(
        &server,
        "/fine",
        "a perfectly reasonable mid-size title here", // 42 chars
        "<p>c</p>",
    )
    .await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let issues = storage.issues_for_run(run_id).unwrap();
    let title_issues: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::TitleLength)
        .collect();

    assert_eq!(title_issues.len(), 2);
    for issue in &title_issues {
        assert_eq!(issue.severity.to_db_string(), "high");
        let data: serde_json::Value = serde_json::from_str(issue.data.as_ref().unwrap()).unwrap();
        let url = data["url"].as_str().unwrap();
        assert!(url.ends_with("/short") || url.ends_with("/long"));
    }
}

#[tokio::test]
async fn test_duplicate_titles_reported_once_with_count() {
    let server = MockServer::start().await;

    let shared = "An identical title shared by two pages";
    mount_page(
        &server,
        "/",
        "Hub for the duplicate title test",
        r#"<a href="/one">1</a><a href="/two">2</a>"#,
    )
    .await;
    mount_page(&server, "/one", shared, "<p>c</p>").await;
    mount_page(&server, "/two", shared, "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let issues = storage.issues_for_run(run_id).unwrap();
    let dupes: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::DuplicateTitles)
        .collect();

    assert_eq!(dupes.len(), 1);
    let data: serde_json::Value = serde_json::from_str(dupes[0].data.as_ref().unwrap()).unwrap();
    assert_eq!(data["count"], 2);
    assert_eq!(data["title"], shared);
}

#[tokio::test]
async fn test_broken_internal_link_attributed_to_linking_page() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Page with one dead outbound link",
        r#"<a href="/missing">gone</a>"#,
    )
    .await;
    // /missing is unmatched and returns 404 from wiremock

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let home = storage
        .page_by_url(run_id, &format!("{}/", server.uri()))
        .unwrap()
        .unwrap();

    let issues = storage.issues_for_run(run_id).unwrap();
    let broken: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::BrokenInternalLink)
        .collect();

    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].page_id, Some(home.id));

    // The 404 target also surfaces as its own finding
    assert!(issues.iter().any(|i| i.kind == IssueKind::Page404));
}

#[tokio::test]
async fn test_robots_allow_overrides_broader_disallow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nAllow: /a\nDisallow: /a/b\nDisallow: /secret"),
        )
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        "Robots precedence test hub page",
        r#"<a href="/a/b">ab</a><a href="/secret">s</a>"#,
    )
    .await;
    mount_page(&server, "/a/b", "Allowed by the narrower rule", "<p>c</p>").await;
    mount_page(&server, "/secret", "Should never be fetched", "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let pages = storage.pages_for_run(run_id).unwrap();
    let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();

    // Allow is checked before Disallow, so /a/b is crawled
    assert!(urls.iter().any(|u| u.ends_with("/a/b")), "{:?}", urls);
    assert!(!urls.iter().any(|u| u.ends_with("/secret")), "{:?}", urls);
}

#[tokio::test]
async fn test_transport_failure_does_not_abort_run() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Page linking to an unreachable host",
        // Nothing listens on this port; the fetch fails at connect time
        r#"<a href="http://127.0.0.1:1/">dead</a><a href="/ok">ok</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "A healthy secondary page", "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    // Both reachable pages were persisted; the dead URL's fetch failed and
    // was skipped without aborting the run
    assert_eq!(storage.count_pages(run_id).unwrap(), 2);
}

#[tokio::test]
async fn test_rescoring_is_idempotent() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Idempotence check landing page",
        r#"<a href="/a">a</a><a href="/missing">m</a>"#,
    )
    .await;
    mount_page(&server, "/a", "Idempotence check second page", "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let fingerprint = |storage: &SqliteStorage| -> Vec<(String, Option<i64>, String, u32, u32, String)> {
        storage
            .issues_for_run(run_id)
            .unwrap()
            .into_iter()
            .map(|i| {
                (
                    i.kind.to_db_string().to_string(),
                    i.page_id,
                    i.description,
                    i.impact_score,
                    i.effort_score,
                    format!("{:.4}", i.priority_score),
                )
            })
            .collect()
    };

    let first = fingerprint(&storage);
    assert!(!first.is_empty());

    // Re-run the scoring engine over the unchanged corpus
    Analyzer::new(&mut storage, run_id).run().unwrap();
    let second = fingerprint(&storage);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_duplicate_run_request_returns_active_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Duplicate request test page", "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();

    let request = RunRequest::new(format!("{}/", server.uri()));
    let first = request_run(&mut storage, &request).unwrap();
    let second = request_run(&mut storage, &request).unwrap();

    assert!(matches!(first, RequestOutcome::Created(_)));
    assert_eq!(second, RequestOutcome::AlreadyActive(first.run_id()));
}

#[tokio::test]
async fn test_sitemap_feeds_coverage_audit() {
    let server = MockServer::start().await;

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/</loc></url>
  <url><loc>{base}/ghost</loc></url>
</urlset>"#,
        base = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sitemap)
                .insert_header("content-type", "application/xml"),
        )
        .mount(&server)
        .await;

    // /ghost is in the sitemap but 404s; / is healthy
    mount_page(&server, "/", "Sitemap audit landing page", "<p>c</p>").await;

    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let run_id = run_analysis(&mut storage, &test_config(3), &server, 100).await;

    let issues = storage.issues_for_run(run_id).unwrap();
    let sitemap_errors: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::SitemapErrorUrl)
        .collect();

    assert_eq!(sitemap_errors.len(), 1);
    let data: serde_json::Value =
        serde_json::from_str(sitemap_errors[0].data.as_ref().unwrap()).unwrap();
    assert!(data["url"].as_str().unwrap().ends_with("/ghost"));
}
