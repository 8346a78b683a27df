//! Crawl statistics
//!
//! Counters are collected by the coordinator while the crawl runs and
//! rendered once at the end.

use crate::output::RunSummary;
use crate::spider::MovieRecord;
use crate::state::TaskState;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Counters for one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    /// Pages fetched, keyed by continuation kind (`category`, `movie`, `rating`)
    pub pages_by_kind: BTreeMap<&'static str, u64>,

    /// Records written to the sink
    pub records: u64,

    /// Records carrying a rating
    pub rated_records: u64,

    /// Finished tasks by terminal state
    pub tasks_by_state: HashMap<TaskState, u64>,

    /// Tasks rejected because an equivalent URL was already scheduled
    pub duplicates_skipped: u64,

    /// Category pages not scheduled because of the page limit
    pub category_pages_dropped: u64,

    /// Category pages robots.txt kept us from fetching
    pub pagination_truncated: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a fetched page of the given kind (see [`crate::spider::Continuation::kind`])
    pub fn record_page(&mut self, kind: &'static str) {
        *self.pages_by_kind.entry(kind).or_insert(0) += 1;
    }

    /// Pages fetched of the given kind
    pub fn pages(&self, kind: &str) -> u64 {
        self.pages_by_kind.get(kind).copied().unwrap_or(0)
    }

    /// Counts a task that reached a terminal state
    pub fn record_state(&mut self, state: TaskState) {
        *self.tasks_by_state.entry(state).or_insert(0) += 1;
    }

    /// Counts a record written to the sink
    pub fn record_item(&mut self, record: &MovieRecord) {
        self.records += 1;
        if record.has_rating() {
            self.rated_records += 1;
        }
    }

    /// Number of tasks in the given state
    pub fn tasks_in(&self, state: TaskState) -> u64 {
        self.tasks_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Total pages fetched
    pub fn total_pages(&self) -> u64 {
        self.pages_by_kind.values().sum()
    }

    /// Total tasks that reached a terminal state
    pub fn total_tasks(&self) -> u64 {
        self.tasks_by_state.values().sum()
    }

    /// Tasks that ended in an error state
    pub fn total_errors(&self) -> u64 {
        self.tasks_by_state
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    /// Percentage of finished tasks that were parsed
    pub fn success_rate(&self) -> f64 {
        let total = self.total_tasks();
        if total == 0 {
            return 0.0;
        }
        (self.tasks_in(TaskState::Parsed) as f64 / total as f64) * 100.0
    }
}

/// Prints crawl statistics to stdout
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!("  Records written: {}", stats.records);
    println!("  Records with rating: {}", stats.rated_records);
    println!();

    println!("Pages fetched: {}", stats.total_pages());
    for (kind, count) in &stats.pages_by_kind {
        println!("  {}: {}", kind, count);
    }
    println!();

    println!("Tasks by State:");
    let total = stats.total_tasks();
    for state in TaskState::ALL {
        let count = stats.tasks_in(state);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if stats.duplicates_skipped > 0
        || stats.category_pages_dropped > 0
        || stats.pagination_truncated > 0
    {
        println!("Skipped:");
        println!("  Duplicate URLs: {}", stats.duplicates_skipped);
        println!("  Category pages over limit: {}", stats.category_pages_dropped);
        println!(
            "  Category pages denied by robots.txt: {}",
            stats.pagination_truncated
        );
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} tasks parsed, {} errors)",
        stats.success_rate(),
        stats.tasks_in(TaskState::Parsed),
        total,
        stats.total_errors()
    );
}

/// Prints the summary of a stored run to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Run {} ===\n", summary.id);
    println!("  Status: {}", summary.status.to_db_string());
    println!("  Started: {}", summary.started_at);
    println!(
        "  Finished: {}",
        summary.finished_at.as_deref().unwrap_or("(not finished)")
    );
    println!("  Config hash: {}", summary.config_hash);
    println!("  Records: {}", summary.records);
    println!("  Records with rating: {}", summary.rated_records);
}
