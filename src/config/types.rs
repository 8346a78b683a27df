use serde::Deserialize;
use std::fmt;

/// Category listing the crawl starts from when none is configured
pub const DEFAULT_SEED_URL: &str = "https://ru.wikipedia.org/wiki/Категория:Фильмы_по_алфавиту";

/// Main configuration structure for Wiki-Movies
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub spider: SpiderConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Category listing page the crawl starts from
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// Number of workers fetching pages concurrently
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// How many times a 5xx response or a timeout is retried
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause before each retry (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Whether robots.txt rules are honoured
    #[serde(rename = "obey-robots", default = "default_true")]
    pub obey_robots: bool,

    /// Stop paginating after this many category pages (0 = unlimited)
    #[serde(rename = "max-category-pages", default)]
    pub max_category_pages: u32,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Supported record output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// SQLite database with `runs` and `movies` tables
    Sqlite,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => write!(f, "jsonl"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Path of the JSON Lines file or SQLite database
    pub path: String,
}

/// Labels the page parsers look for in infoboxes and navigation links
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderConfig {
    #[serde(rename = "genre-marker", default = "default_genre_marker")]
    pub genre_marker: String,

    #[serde(rename = "director-marker", default = "default_director_marker")]
    pub director_marker: String,

    #[serde(rename = "countries-marker", default = "default_countries_marker")]
    pub countries_marker: String,

    #[serde(rename = "year-marker", default = "default_year_marker")]
    pub year_marker: String,

    /// Header link text of the infobox row pointing at the rating site
    #[serde(rename = "rating-authority", default = "default_rating_authority")]
    pub rating_authority: String,

    /// Visible text of the category "next page" link
    #[serde(rename = "next-page-label", default = "default_next_page_label")]
    pub next_page_label: String,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            genre_marker: default_genre_marker(),
            director_marker: default_director_marker(),
            countries_marker: default_countries_marker(),
            year_marker: default_year_marker(),
            rating_authority: default_rating_authority(),
            next_page_label: default_next_page_label(),
        }
    }
}

fn default_seed_url() -> String {
    DEFAULT_SEED_URL.to_string()
}

fn default_concurrency() -> u32 {
    8
}

fn default_request_delay() -> u64 {
    250
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_genre_marker() -> String {
    "Жанр".to_string()
}

fn default_director_marker() -> String {
    "Реж".to_string()
}

fn default_countries_marker() -> String {
    "Стран".to_string()
}

fn default_year_marker() -> String {
    "Год".to_string()
}

fn default_rating_authority() -> String {
    "IMDb".to_string()
}

fn default_next_page_label() -> String {
    "Следующая страница".to_string()
}
