//! Scheduler for the shared task frontier and per-host pacing
//!
//! This module handles:
//! - Priority ordering (rating pages, then movie pages, then category pages)
//! - Dropping duplicate movie and category URLs
//! - Minimum delays between requests to one host, raised by robots.txt
//! - Detecting quiescence: nothing queued and nothing in flight
//!
//! Workers call [`Scheduler::next_task`] until it returns `None` and report
//! each finished task with [`Scheduler::complete`].

use crate::config::CrawlerConfig;
use crate::spider::{Continuation, Task};
use crate::state::HostState;
use crate::url::extract_host;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// A task waiting in the frontier
#[derive(Debug)]
struct QueuedTask {
    task: Task,
    host: String,
    priority: u8,
    seq: u64,
}

// BinaryHeap is a max-heap: the lowest priority value, then the oldest
// sequence number, must compare greatest.
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

/// What happened to a task handed to [`Scheduler::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added to the frontier
    Queued,
    /// An equivalent URL was already scheduled
    Duplicate,
    /// Category page beyond the configured page limit
    OverPageLimit,
    /// URL has no host, or the scheduler is shut down
    Rejected,
}

#[derive(Debug, Default)]
struct Inner {
    frontier: BinaryHeap<QueuedTask>,
    seen: HashSet<String>,
    hosts: HashMap<String, HostState>,
    /// Queued plus in-flight tasks
    outstanding: usize,
    next_seq: u64,
    duplicates_skipped: u64,
    category_pages_dropped: u64,
    shut_down: bool,
}

/// Shared frontier used by all crawl workers
#[derive(Debug)]
pub struct Scheduler {
    inner: Mutex<Inner>,
    notify: Notify,
    min_delay: Duration,
    max_category_pages: u32,
}

impl Scheduler {
    /// Creates a scheduler from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        Self::with_limits(
            Duration::from_millis(config.request_delay_ms),
            config.max_category_pages,
        )
    }

    /// Creates a scheduler with an explicit host delay and category page limit
    ///
    /// `max_category_pages` of 0 means no limit.
    pub fn with_limits(min_delay: Duration, max_category_pages: u32) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
            min_delay,
            max_category_pages,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the counters usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a task to the frontier
    pub fn schedule(&self, task: Task) -> Admission {
        let admission = self.admit(&mut self.lock(), task);
        if admission == Admission::Queued {
            self.notify.notify_waiters();
        }
        admission
    }

    fn admit(&self, inner: &mut Inner, task: Task) -> Admission {
        if inner.shut_down {
            return Admission::Rejected;
        }

        if let Continuation::Category { page_number } = task.continuation {
            if self.max_category_pages > 0 && page_number > self.max_category_pages {
                tracing::info!(
                    "Category page limit of {} reached, not following {}",
                    self.max_category_pages,
                    task.target
                );
                inner.category_pages_dropped += 1;
                return Admission::OverPageLimit;
            }
        }

        let Some(host) = extract_host(&task.target) else {
            tracing::warn!("Dropping task without host: {}", task.target);
            return Admission::Rejected;
        };

        if let Some(key) = task.dedup_key() {
            if !inner.seen.insert(key) {
                tracing::trace!("Skipping duplicate {} task {}", task.continuation.kind(), task.target);
                inner.duplicates_skipped += 1;
                return Admission::Duplicate;
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.outstanding += 1;
        inner.frontier.push(QueuedTask {
            priority: task.continuation.priority(),
            task,
            host,
            seq,
        });

        Admission::Queued
    }

    /// Waits for the next task whose host may be contacted
    ///
    /// Returns `None` once nothing is queued and nothing is in flight, or
    /// after [`Scheduler::shutdown`].
    pub async fn next_task(&self) -> Option<Task> {
        loop {
            // Registered before inspecting the state so no wakeup is missed
            let notified = self.notify.notified();

            let wait = {
                let mut inner = self.lock();

                if inner.shut_down || (inner.frontier.is_empty() && inner.outstanding == 0) {
                    drop(inner);
                    self.notify.notify_waiters();
                    return None;
                }

                let now = Instant::now();
                if let Some(task) = self.pop_ready(&mut inner, now) {
                    return Some(task);
                }

                self.earliest_ready(&inner, now)
            };

            match wait {
                Some(delay) => {
                    tracing::trace!("No host ready, waiting {:?}", delay);
                    tokio::select! {
                        _ = notified => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                // Frontier empty but tasks in flight: wait for their follow-ups
                None => notified.await,
            }
        }
    }

    /// Pops the best task whose host is ready and records the request
    fn pop_ready(&self, inner: &mut Inner, now: Instant) -> Option<Task> {
        let mut not_ready = Vec::new();
        let mut found = None;

        while let Some(queued) = inner.frontier.pop() {
            let state = inner.hosts.entry(queued.host.clone()).or_default();
            if state.can_request(self.min_delay, now) {
                state.record_request(now);
                found = Some(queued.task);
                break;
            }
            not_ready.push(queued);
        }

        inner.frontier.extend(not_ready);
        found
    }

    /// Time until some queued host becomes ready, or None if nothing is queued
    fn earliest_ready(&self, inner: &Inner, now: Instant) -> Option<Duration> {
        inner
            .frontier
            .iter()
            .map(|queued| {
                inner
                    .hosts
                    .get(&queued.host)
                    .and_then(|state| state.time_until_next_request(self.min_delay, now))
                    .unwrap_or(Duration::ZERO)
            })
            .min()
    }

    /// Reports a finished task and queues its follow-ups
    ///
    /// Follow-ups are admitted before the finished task stops counting as in
    /// flight, so the crawl cannot look quiescent in between.
    pub fn complete(&self, followups: Vec<Task>) {
        {
            let mut inner = self.lock();
            for task in followups {
                self.admit(&mut inner, task);
            }
            inner.outstanding = inner.outstanding.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Applies a robots.txt `Crawl-delay` to a host
    pub fn set_crawl_delay(&self, host: &str, seconds: f64) {
        self.lock()
            .hosts
            .entry(host.to_string())
            .or_default()
            .set_crawl_delay_secs(seconds);
    }

    /// Drops every queued task and makes `next_task` return `None`
    ///
    /// Tasks already in flight may still call `complete`; their follow-ups
    /// are discarded.
    pub fn shutdown(&self) {
        {
            let mut inner = self.lock();
            inner.shut_down = true;
            let dropped = inner.frontier.len();
            inner.frontier.clear();
            inner.outstanding = inner.outstanding.saturating_sub(dropped);
        }
        self.notify.notify_waiters();
    }

    /// Number of tasks waiting in the frontier
    pub fn queued(&self) -> usize {
        self.lock().frontier.len()
    }

    /// Number of queued plus in-flight tasks
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Number of tasks skipped as duplicates
    pub fn duplicates_skipped(&self) -> u64 {
        self.lock().duplicates_skipped
    }

    /// Number of category pages not scheduled because of the page limit
    pub fn category_pages_dropped(&self) -> u64 {
        self.lock().category_pages_dropped
    }

    #[cfg(test)]
    fn host_state(&self, host: &str) -> Option<HostState> {
        self.lock().hosts.get(host).cloned()
    }
}
