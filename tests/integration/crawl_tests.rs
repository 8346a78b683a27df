//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small wiki (two category pages, a
//! handful of movie articles and a rating site) and run full crawls against it.

use std::path::Path;
use tempfile::TempDir;
use wiki_movies::config::{
    Config, CrawlerConfig, OutputConfig, OutputFormat, SpiderConfig, UserAgentConfig,
};
use wiki_movies::crawler::Coordinator;
use wiki_movies::output::{load_run_summary, open_sink, RunStatus};
use wiki_movies::spider::RATING_NOT_FOUND;
use wiki_movies::{MovieRecord, TaskState};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(seed: String, output: OutputConfig) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed,
            max_concurrent_requests: 4,
            request_delay_ms: 0,
            max_retries: 0,
            retry_delay_ms: 0,
            request_timeout_secs: 5,
            obey_robots: true,
            max_category_pages: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output,
        spider: SpiderConfig::default(),
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

fn category_page(links: &[&str], next: Option<&str>) -> String {
    let items: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    let next = next
        .map(|href| format!(r#"<a href="{}">Следующая страница</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body>
        <a href="/wiki/Films">Предыдущая страница</a>
        <div class="mw-category"><div class="mw-category-group"><h3>А</h3><ul>{}</ul></div></div>
        {}
        </body></html>"#,
        items, next
    )
}

fn movie_page(title: &str, year: &str, rating_href: Option<&str>) -> String {
    let rating_row = rating_href
        .map(|href| {
            format!(
                r#"<tr><th><a href="/wiki/IMDb">IMDb</a></th><td><a href="{}">ID</a></td></tr>"#,
                href
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><body><table class="infobox"><tbody>
        <tr><th colspan="2" class="infobox-above">{}</th></tr>
        <tr><th>Жанр</th><td><a href="/wiki/Drama">драма</a>, <a href="/wiki/SF">фантастика</a></td></tr>
        <tr><th>Режиссёр</th><td><a href="/wiki/T">Андрей Тарковский</a></td></tr>
        <tr><th>Страна</th><td>СССР</td></tr>
        <tr><th>Год</th><td><a href="/wiki/Year">{}</a></td></tr>
        {}
        </tbody></table></body></html>"#,
        title, year, rating_row
    )
}

fn rating_page(score: &str) -> String {
    format!(
        r#"<html><body><div data-testid="hero-rating-bar__aggregate-rating__score"><span>{}</span><span>/10</span></div></body></html>"#,
        score
    )
}

const ROBOTS_DENY_SECRET: &str = "User-agent: *\nDisallow: /wiki/Secret";

/// Mounts the mock wiki serving `robots` as its robots.txt and returns the seed URL
async fn mount_wiki(server: &MockServer, robots: &str) -> String {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(robots))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Films"))
        .respond_with(html(category_page(
            &["/wiki/Stalker", "/wiki/Solaris", "/wiki/Secret"],
            Some("/w/index.php?title=Films&pagefrom=M"),
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("pagefrom", "M"))
        .respond_with(html(category_page(
            &["/wiki/Mirror", "/wiki/Broken", "/wiki/Solaris#plot"],
            None,
        )))
        .mount(server)
        .await;

    let stalker_rating = format!("{}/title/tt0079944/", base);
    Mock::given(method("GET"))
        .and(path("/wiki/Stalker"))
        .respond_with(html(movie_page("Сталкер", "1979", Some(&stalker_rating))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Solaris"))
        .respond_with(html(movie_page("Солярис", "1972", None)))
        .expect(1)
        .mount(server)
        .await;

    // Rating page for this one is not mounted and answers 404
    Mock::given(method("GET"))
        .and(path("/wiki/Mirror"))
        .respond_with(html(movie_page("Зеркало", "1974", Some("/title/tt0072443/"))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Broken"))
        .respond_with(html("<html><body><p>No infobox</p></body></html>".to_string()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Secret"))
        .respond_with(html(movie_page("Тайна", "1980", None)))
        .expect(0)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/title/tt0079944/"))
        .respond_with(html(rating_page("8.1")))
        .mount(server)
        .await;

    format!("{}/wiki/Films", base)
}

fn read_records(path: &Path) -> Vec<MovieRecord> {
    std::fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect()
}

#[tokio::test]
async fn test_full_crawl_to_json_lines() {
    let server = MockServer::start().await;
    let seed = mount_wiki(&server, ROBOTS_DENY_SECRET).await;

    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("movies.jsonl");
    let output = OutputConfig {
        format: OutputFormat::Jsonl,
        path: output_path.to_string_lossy().to_string(),
    };
    let config = create_test_config(seed, output);

    let sink = open_sink(&config.output, "test-hash").expect("Failed to open sink");
    let stats = Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    let mut records = read_records(&output_path);
    records.sort_by(|a, b| a.title.cmp(&b.title));

    // Every reachable movie yields exactly one record
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Зеркало", "Солярис", "Сталкер"]);

    let stalker = &records[2];
    assert_eq!(stalker.rating, "8.1");
    assert_eq!(stalker.genre, "драма, фантастика");
    assert_eq!(stalker.director, "Андрей Тарковский");
    assert_eq!(stalker.countries, "СССР");
    assert_eq!(stalker.year, "1979");

    assert_eq!(records[0].rating, RATING_NOT_FOUND);
    assert_eq!(records[0].year, "1974");
    assert_eq!(records[1].rating, RATING_NOT_FOUND);

    assert_eq!(stats.records, 3);
    assert_eq!(stats.rated_records, 1);
    assert_eq!(stats.pages("category"), 2);
    assert_eq!(stats.pages("rating"), 1);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.tasks_in(TaskState::RobotsDenied), 1);
    assert_eq!(stats.tasks_in(TaskState::ParseFailed), 1);
    assert_eq!(stats.tasks_in(TaskState::DeadLink), 1);
}

#[tokio::test]
async fn test_category_limit_with_sqlite_output() {
    let server = MockServer::start().await;
    let seed = mount_wiki(&server, ROBOTS_DENY_SECRET).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("movies.db");
    let output = OutputConfig {
        format: OutputFormat::Sqlite,
        path: db_path.to_string_lossy().to_string(),
    };
    let mut config = create_test_config(seed, output);
    config.crawler.max_category_pages = 1;

    let sink = open_sink(&config.output, "limited").expect("Failed to open sink");
    let stats = Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(stats.pages("category"), 1);
    assert_eq!(stats.category_pages_dropped, 1);
    assert_eq!(stats.records, 2);

    let summary = load_run_summary(&db_path)
        .expect("Failed to read summary")
        .expect("No run recorded");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.config_hash, "limited");
    assert_eq!(summary.records, 2);
    assert_eq!(summary.rated_records, 1);
    assert!(summary.finished_at.is_some());
}

#[tokio::test]
async fn test_robots_denied_pagination_is_reported() {
    let server = MockServer::start().await;
    let seed = mount_wiki(
        &server,
        "User-agent: *\nDisallow: /w/\nDisallow: /wiki/Secret",
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("movies.jsonl");
    let output = OutputConfig {
        format: OutputFormat::Jsonl,
        path: output_path.to_string_lossy().to_string(),
    };
    let config = create_test_config(seed, output);

    let sink = open_sink(&config.output, "denied").expect("Failed to open sink");
    let stats = Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    // Only the movies listed on the first category page are reached
    let mut titles: Vec<String> = read_records(&output_path)
        .into_iter()
        .map(|record| record.title)
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Солярис", "Сталкер"]);

    assert_eq!(stats.pages("category"), 1);
    assert_eq!(stats.pagination_truncated, 1);
    assert_eq!(stats.tasks_in(TaskState::RobotsDenied), 2);
}

#[tokio::test]
async fn test_unreachable_seed_finishes_empty() {
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("movies.jsonl");
    let output = OutputConfig {
        format: OutputFormat::Jsonl,
        path: output_path.to_string_lossy().to_string(),
    };
    let mut config = create_test_config("http://127.0.0.1:9/wiki/Films".to_string(), output);
    config.crawler.obey_robots = false;

    let sink = open_sink(&config.output, "empty").expect("Failed to open sink");
    let stats = Coordinator::new(config, sink)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(stats.records, 0);
    assert_eq!(stats.tasks_in(TaskState::Unreachable), 1);
    assert!(read_records(&output_path).is_empty());
}
