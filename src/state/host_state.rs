use std::time::{Duration, Instant};

/// Tracks request pacing for one host
///
/// The scheduler keeps one of these per host so that concurrent workers never
/// hit the same host closer together than the configured delay (or the host's
/// robots.txt `Crawl-delay`, whichever is longer).
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests handed out for this host
    pub request_count: u32,

    /// When the last request to this host was handed out
    pub last_request_time: Option<Instant>,

    /// Delay requested by the host's robots.txt
    pub crawl_delay: Option<Duration>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective gap between requests: the longer of `min_delay` and the crawl delay
    pub fn effective_delay(&self, min_delay: Duration) -> Duration {
        self.crawl_delay.map_or(min_delay, |d| d.max(min_delay))
    }

    /// Checks if a request can be made to this host now
    pub fn can_request(&self, min_delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(min_delay, now).is_none()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let delay = self.effective_delay(min_delay);
        let elapsed = now.saturating_duration_since(last);

        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was handed out for this host
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Applies a robots.txt `Crawl-delay` given in seconds
    ///
    /// Negative or non-finite values are ignored.
    pub fn set_crawl_delay_secs(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.crawl_delay = Some(Duration::from_secs_f64(seconds));
        }
    }
}
