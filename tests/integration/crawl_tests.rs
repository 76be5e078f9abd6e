//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use trawler::config::{load_config, Config};
use trawler::crawler::{
    build_http_client, run_crawl, run_crawl_with, CrawlReport, CrawlServices, StopReason,
};
use trawler::output::{export_sets, load_exported};
use trawler::storage::{RunStatus, SqliteStorage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a configuration file into `dir` and loads it
fn create_test_config(dir: &Path, seed: &str, limit: usize, max_workers: usize) -> Config {
    let toml = format!(
        r#"
[crawler]
limit = {limit}
max-workers = {max_workers}
stuck-timeout-ms = 300
settle-delay-ms = 2000
pacing-delay-ms = 0
idle-poll-ms = 10
progress-interval-ms = 100

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{db}"
export-dir = "{export}"

[seeds]
urls = ["{seed}"]

[filters]
keywords = ["Gaming"]
ignore = ["adtrack"]
"#,
        db = dir.join("trawler.db").display(),
        export = dir.join("export").display(),
    );

    let config_path = dir.join("trawler.toml");
    std::fs::write(&config_path, toml).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

/// Runs a crawl recording into a fresh in-memory database
async fn crawl(config: &Config) -> (CrawlReport, Arc<SqliteStorage>) {
    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    storage.begin_run("test").unwrap();

    let client = build_http_client(config).unwrap();
    let services = CrawlServices::from_config(config, &client, storage.clone()).unwrap();
    let report = run_crawl_with(config, client, services)
        .await
        .expect("Crawl failed");
    (report, storage)
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

/// Index linking to a keyword page, an ignored tracker and a disallowed path
async fn site_a() -> MockServer {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;

    mount_page(
        &server,
        "/index",
        r#"<html><head><title>Site A</title></head><body>
            <a href="/gaming-news">Gaming news</a>
            <a href="http://adtrack.example/x">Sponsored</a>
            <a href="/private/secret">Members</a>
            <a href="/go">Shortcut</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/gaming-news",
        r#"<html><head><title>Gaming News</title></head><body>
            <p>Gaming consoles sold out again this week.</p>
            <p>Advertisement: buy a chair</p>
            <p>Analysts expect gaming revenue to grow.</p>
        </body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/secret"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_keyword_scenario() {
    let server = site_a().await;
    let dir = TempDir::new().unwrap();
    let index = format!("{}/index", server.uri());
    let gaming = format!("{}/gaming-news", server.uri());
    let private = format!("{}/private/secret", server.uri());
    let shortcut = format!("{}/go", server.uri());
    let config = create_test_config(dir.path(), &index, 50, 4);

    let (report, _storage) = crawl(&config).await;
    let sets = &report.sets;

    assert!(sets.visited.contains(&index));
    assert!(sets.visited.contains(&gaming));
    assert!(sets.visited.contains(&shortcut));
    assert_eq!(sets.interesting, BTreeSet::from([gaming.clone()]));
    assert!(sets.blocked.contains("http://adtrack.example/x"));
    assert!(sets.blocked.contains(&private));
    assert!(!sets.visited.contains(&private));
    assert_eq!(sets.confident, BTreeSet::from([gaming]));
    assert_eq!(report.stop_reason, StopReason::Stuck);
    assert_eq!(report.abandoned(), 0);
}

#[tokio::test]
async fn test_sets_stay_disjoint() {
    let server = site_a().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}/index", server.uri()), 50, 4);

    let (report, _storage) = crawl(&config).await;
    let sets = &report.sets;

    assert!(sets.visited.is_disjoint(&sets.blocked));
    assert!(sets.visited.is_disjoint(&sets.remaining));
    assert!(sets.blocked.is_disjoint(&sets.remaining));
    assert!(sets.interesting.is_subset(&sets.visited));
    assert!(sets.confident.is_subset(&sets.interesting));
}

/// Every page links to the next three numbered pages
async fn endless_site() -> MockServer {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    for page in 0..60 {
        let links: String = (1..=3)
            .map(|step| format!(r#"<a href="/page{}">next</a>"#, page + step))
            .collect();
        mount_page(&server, &format!("/page{}", page), links).await;
    }
    server
}

#[tokio::test]
async fn test_budget_is_respected() {
    let server = endless_site().await;
    let dir = TempDir::new().unwrap();
    let limit = 8;
    let max_workers = 3;
    let config = create_test_config(dir.path(), &format!("{}/page0", server.uri()), limit, max_workers);

    let (report, storage) = crawl(&config).await;

    assert_eq!(report.stop_reason, StopReason::Budget);
    let processed = report.sets.visited.len() + report.sets.blocked.len();
    assert!(processed >= limit);
    assert!(processed <= limit + max_workers);

    // Visited pages are recorded with a response time, planned ones without
    let records = storage.records_for_run(storage.current_run().unwrap()).unwrap();
    let fetched = records.iter().filter(|r| r.was_fetched()).count();
    let not_fetched = records.iter().filter(|r| !r.was_fetched()).count();
    assert_eq!(fetched, report.sets.visited.len());
    assert_eq!(not_fetched, report.sets.remaining.len());
    assert_eq!(report.recorded_remaining, report.sets.remaining.len());
}

#[tokio::test]
async fn test_stuck_crawl_drains_before_budget() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(&server, "/lonely", "<html><body>no links</body></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}/lonely", server.uri()), 1000, 4);

    let started = std::time::Instant::now();
    let (report, _storage) = crawl(&config).await;

    assert_eq!(report.stop_reason, StopReason::Stuck);
    assert_eq!(report.sets.visited.len(), 1);
    assert!(report.sets.remaining.is_empty());
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn test_shared_link_is_recorded_once() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let hub: String = (0..10)
        .map(|i| format!(r#"<a href="/spoke{}">spoke</a>"#, i))
        .collect();
    mount_page(&server, "/hub", hub).await;
    for i in 0..10 {
        mount_page(
            &server,
            &format!("/spoke{}", i),
            r#"<a href="/shared">shared</a><a href="/shared?">again</a>"#.to_string(),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}/hub", server.uri()), 100, 8);
    let (report, storage) = crawl(&config).await;

    let shared = format!("{}/shared", server.uri());
    assert!(report.sets.visited.contains(&shared));

    let records = storage.records_for_run(storage.current_run().unwrap()).unwrap();
    assert_eq!(records.iter().filter(|r| r.url == shared).count(), 1);
    let unique: BTreeSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(unique.len(), records.len());
}

#[tokio::test]
async fn test_export_round_trip() {
    let server = endless_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}/page0", server.uri()), 6, 2);

    let (report, _storage) = crawl(&config).await;
    let export_dir = Path::new(&config.output.export_dir);
    export_sets(&report.sets, export_dir).unwrap();

    let loaded = load_exported(export_dir).unwrap();
    assert_eq!(loaded, report.sets);

    let union: BTreeSet<String> = loaded
        .visited
        .iter()
        .chain(&loaded.blocked)
        .chain(&loaded.remaining)
        .cloned()
        .collect();
    assert_eq!(union, report.sets.touched());
    assert!(!loaded.remaining.is_empty());
}

#[tokio::test]
async fn test_run_crawl_tracks_run_in_database() {
    let server = site_a().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}/index", server.uri()), 50, 2);

    let report = run_crawl(&config, "cafebabe").await.unwrap();
    assert_eq!(report.sets.visited.len(), 3);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "cafebabe");
    assert!(run.finished_at.is_some());

    let stats = storage.run_stats(run.id).unwrap();
    assert_eq!(stats.fetched, 3);
}
