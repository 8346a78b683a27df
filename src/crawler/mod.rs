//! Crawler module for fetching and dispatching pages
//!
//! This module contains the runtime around the page parsers:
//! - HTTP fetching with retry logic
//! - The shared task frontier with per-host pacing
//! - Worker coordination and record output

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy, MAX_REDIRECTS};
pub use scheduler::{Admission, Scheduler};
