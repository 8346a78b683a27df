//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with redirect following
//! - Retry logic for transient failures
//! - Error classification into task states

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::state::TaskState;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum number of redirects followed per request
pub const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Decoded page body
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// HTTP error that maps to a specific task state
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// The task state this error maps to
        state: TaskState,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// The task state this error maps to
        state: TaskState,
    },
}

impl FetchResult {
    /// The terminal state of a failed fetch, or None on success
    pub fn failure_state(&self) -> Option<TaskState> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { .. } => Some(TaskState::ContentMismatch),
            Self::HttpError { state, .. } | Self::NetworkError { state, .. } => Some(*state),
        }
    }
}

/// How transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wiki_movies::config::UserAgentConfig;
/// use wiki_movies::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "WikiMovies".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with retry handling and error classification
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 404 / 410 | Immediate → DeadLink |
/// | HTTP 429 | Immediate → RateLimited |
/// | HTTP 5xx | Retry up to `max_retries`, then → Failed |
/// | Timeout | Retry up to `max_retries`, then → Unreachable |
/// | Connection refused / TLS error | Immediate → Unreachable |
/// | Too many redirects | Immediate → Failed |
/// | Non-HTML body | Immediate → ContentMismatch |
pub async fn fetch_url(client: &Client, url: &str, retry: RetryPolicy) -> FetchResult {
    let mut attempt = 0;

    loop {
        let result = fetch_once(client, url).await;

        let transient = matches!(
            &result,
            FetchResult::HttpError { status_code, .. } if *status_code >= 500
        ) || matches!(&result, FetchResult::NetworkError { error, .. } if error == TIMEOUT);

        if !transient || attempt >= retry.max_retries {
            return result;
        }

        attempt += 1;
        tracing::debug!(
            "Transient failure for {} ({:?}), retry {}/{}",
            url,
            result.failure_state(),
            attempt,
            retry.max_retries
        );
        tokio::time::sleep(retry.delay).await;
    }
}

const TIMEOUT: &str = "Request timeout";

async fn fetch_once(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if let Some(state) = classify_status(status) {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            state,
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_error(&e),
    }
}

/// Maps a non-success status to its task state
fn classify_status(status: StatusCode) -> Option<TaskState> {
    if status.is_success() {
        return None;
    }

    Some(match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => TaskState::DeadLink,
        StatusCode::TOO_MANY_REQUESTS => TaskState::RateLimited,
        _ => TaskState::Failed,
    })
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: TIMEOUT.to_string(),
            state: TaskState::Unreachable,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            state: TaskState::Unreachable,
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", e),
            state: TaskState::Failed,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            state: TaskState::Failed,
        }
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
