//! Robots.txt caching
//!
//! Entries expire after 24 hours so that long crawls pick up rule changes.

use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::extract_host;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Cached robots.txt data for a host
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: Arc<ParsedRobots>,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content: Arc::new(content),
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Returns how long ago the robots.txt was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Per-host robots.txt cache shared by all workers
///
/// Two workers missing the cache for the same host at the same time may both
/// fetch robots.txt; the later result replaces the earlier one.
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    agent: String,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// `agent` is the product token matched against `User-agent` lines.
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The product token used for matching
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Returns the rules for the host of `url`, fetching them on a miss
    pub async fn rules_for(&self, url: &Url) -> Arc<ParsedRobots> {
        let Some(host) = extract_host(url) else {
            return Arc::new(ParsedRobots::allow_all());
        };

        {
            let entries = self.entries.lock().await;
            if let Some(cached) = entries.get(&host) {
                if !cached.is_stale() {
                    return Arc::clone(&cached.content);
                }
            }
        }

        let cached = CachedRobots::new(fetch_robots(&self.client, url).await);
        let rules = Arc::clone(&cached.content);
        self.entries.lock().await.insert(host, cached);
        rules
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
