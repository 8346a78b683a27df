//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator seeds the scheduler, spawns the worker tasks and drains
//! their events into the record sink. Workers own everything between a task
//! leaving the queue and its follow-ups entering it:
//! - robots.txt checks and crawl delays
//! - fetching with retries
//! - dispatching the page to the parser named by the task's continuation

use crate::config::Config;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::{build_http_client, fetch_url, FetchResult, RetryPolicy};
use crate::output::{open_sink, CrawlStats, OutputError, RecordSink, RunStatus};
use crate::robots::RobotsCache;
use crate::spider::{Continuation, MovieRecord, MovieSpider, Page, Task, RATING_NOT_FOUND};
use crate::state::TaskState;
use crate::url::extract_host;
use crate::MovieError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

/// Records between progress log lines
const PROGRESS_INTERVAL: u64 = 25;

/// Capacity of the worker event channel
const EVENT_BUFFER: usize = 256;

/// What workers report back to the coordinator
#[derive(Debug)]
enum WorkerEvent {
    /// A finished record
    Record(MovieRecord),

    /// A task reached a terminal state
    Finished {
        kind: &'static str,
        fetched: bool,
        state: TaskState,
    },
}

/// State shared by all workers
struct WorkerContext {
    scheduler: Scheduler,
    spider: MovieSpider,
    client: Client,
    robots: Option<RobotsCache>,
    retry: RetryPolicy,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<WorkerContext>,
    sink: Box<dyn RecordSink>,
    seed: Url,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator writing into `sink`
    ///
    /// # Errors
    ///
    /// Fails if the seed URL does not parse, the HTTP client cannot be built
    /// or a parser selector does not compile.
    pub fn new(config: Config, sink: Box<dyn RecordSink>) -> Result<Self, MovieError> {
        let seed = Url::parse(&config.crawler.seed_url)?;

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        let robots = config
            .crawler
            .obey_robots
            .then(|| RobotsCache::new(client.clone(), config.user_agent.crawler_name.clone()));

        let context = WorkerContext {
            scheduler: Scheduler::new(&config.crawler),
            spider: MovieSpider::new(config.spider.clone())?,
            client,
            robots,
            retry: RetryPolicy::from_config(&config.crawler),
        };

        Ok(Self {
            context: Arc::new(context),
            sink,
            seed,
            workers: config.crawler.max_concurrent_requests.max(1) as usize,
        })
    }

    /// Runs the crawl until quiescence, an interrupt or an output failure
    ///
    /// A panicking worker marks the run as failed; its error is returned
    /// once the sink has been finished.
    ///
    /// On interrupt (Ctrl-C) queued tasks are dropped, in-flight tasks finish
    /// and the run is recorded as interrupted.
    pub async fn run(mut self) -> Result<CrawlStats, MovieError> {
        let started = Instant::now();
        let mut stats = CrawlStats::new();

        tracing::info!(
            "Starting crawl from {} with {} workers",
            self.seed,
            self.workers
        );
        self.context
            .scheduler
            .schedule(MovieSpider::start_task(self.seed.clone()));

        let (events_tx, mut events) = mpsc::channel(EVENT_BUFFER);
        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let context = Arc::clone(&self.context);
            let events_tx = events_tx.clone();
            handles.push(tokio::spawn(run_worker(id, context, events_tx)));
        }
        drop(events_tx);

        let mut status = RunStatus::Completed;
        let mut output_error: Option<OutputError> = None;
        let mut interrupted = false;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if output_error.is_some() {
                        continue;
                    }
                    if let Err(e) = handle_event(self.sink.as_mut(), &mut stats, event) {
                        tracing::error!("Output failed, stopping crawl: {}", e);
                        self.context.scheduler.shutdown();
                        status = RunStatus::Failed;
                        output_error = Some(e);
                    } else if let Some(progress) = progress_due(&stats) {
                        tracing::info!(
                            "Progress: {} records, {} pages fetched, {} queued, {:.2} pages/sec",
                            progress,
                            stats.total_pages(),
                            self.context.scheduler.queued(),
                            stats.total_pages() as f64 / started.elapsed().as_secs_f64()
                        );
                    }
                }
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    tracing::warn!("Interrupted, finishing in-flight requests");
                    interrupted = true;
                    if status == RunStatus::Completed {
                        status = RunStatus::Interrupted;
                    }
                    self.context.scheduler.shutdown();
                }
            }
        }

        let mut worker_error = None;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                status = RunStatus::Failed;
                if worker_error.is_none() {
                    worker_error = Some(e);
                }
            }
        }

        stats.duplicates_skipped = self.context.scheduler.duplicates_skipped();
        stats.category_pages_dropped = self.context.scheduler.category_pages_dropped();
        stats.elapsed = started.elapsed();

        if stats.pagination_truncated > 0 {
            tracing::warn!(
                "Category listing incomplete: {} page(s) disallowed by robots.txt",
                stats.pagination_truncated
            );
        }

        self.sink.finish(&stats, status)?;
        if let Some(e) = output_error {
            return Err(e.into());
        }
        if let Some(e) = worker_error {
            return Err(e.into());
        }

        tracing::info!(
            "Crawl {}: {} records from {} pages in {:?}",
            status.to_db_string(),
            stats.records,
            stats.total_pages(),
            stats.elapsed
        );

        Ok(stats)
    }
}

/// Returns the record count when a progress line is due
fn progress_due(stats: &CrawlStats) -> Option<u64> {
    (stats.records > 0 && stats.records % PROGRESS_INTERVAL == 0).then_some(stats.records)
}

fn handle_event(
    sink: &mut dyn RecordSink,
    stats: &mut CrawlStats,
    event: WorkerEvent,
) -> Result<(), OutputError> {
    match event {
        WorkerEvent::Record(record) => {
            sink.write_record(&record)?;
            stats.record_item(&record);
        }
        WorkerEvent::Finished {
            kind,
            fetched,
            state,
        } => {
            if fetched {
                stats.record_page(kind);
            }
            if kind == "category" && state == TaskState::RobotsDenied {
                stats.pagination_truncated += 1;
            }
            stats.record_state(state);
        }
    }
    Ok(())
}

/// Completes a task taken from the scheduler when dropped
///
/// Dropped during unwinding too, so a panicking worker still releases its
/// task and the remaining workers can reach quiescence.
struct Completion<'a> {
    scheduler: &'a Scheduler,
    followups: Vec<Task>,
}

impl<'a> Completion<'a> {
    fn new(scheduler: &'a Scheduler) -> Self {
        Self {
            scheduler,
            followups: Vec::new(),
        }
    }
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.scheduler.complete(std::mem::take(&mut self.followups));
    }
}

async fn run_worker(id: usize, context: Arc<WorkerContext>, events: mpsc::Sender<WorkerEvent>) {
    tracing::debug!("Worker {} started", id);

    while let Some(task) = context.scheduler.next_task().await {
        let mut completion = Completion::new(&context.scheduler);
        completion.followups = process_task(&context, task, &events).await;
    }

    tracing::debug!("Worker {} finished", id);
}

/// Fetches and parses one task, returning its follow-up tasks
async fn process_task(
    context: &WorkerContext,
    task: Task,
    events: &mpsc::Sender<WorkerEvent>,
) -> Vec<Task> {
    let kind = task.continuation.kind();
    tracing::debug!("Fetching {} page {}", kind, task.target);

    if let Some(robots) = &context.robots {
        let rules = robots.rules_for(&task.target).await;

        if let (Some(host), Some(delay)) = (
            extract_host(&task.target),
            rules.crawl_delay(robots.agent()),
        ) {
            context.scheduler.set_crawl_delay(&host, delay);
        }

        if !rules.is_allowed(task.target.as_str(), robots.agent()) {
            match &task.continuation {
                Continuation::Category { page_number } => tracing::warn!(
                    "Category page {} ({}) disallowed by robots.txt, pagination truncated",
                    page_number,
                    task.target
                ),
                _ => tracing::info!("{} disallowed by robots.txt", task.target),
            }
            abandon(task, TaskState::RobotsDenied, events).await;
            return Vec::new();
        }
    }

    let (final_url, body) = match fetch_url(&context.client, task.target.as_str(), context.retry).await
    {
        FetchResult::Success {
            final_url, body, ..
        } => (final_url, body),
        failure => {
            let state = failure.failure_state().unwrap_or(TaskState::Failed);
            tracing::warn!("Failed to fetch {} ({}): {:?}", task.target, state, failure);
            abandon(task, state, events).await;
            return Vec::new();
        }
    };

    let page_url = Url::parse(&final_url).unwrap_or_else(|_| task.target.clone());
    let page = Page::new(page_url, body);

    let (requests, state) = match context.spider.parse(&page, task.continuation) {
        Ok(output) => {
            for item in output.items {
                send(events, WorkerEvent::Record(item)).await;
            }
            (output.requests, TaskState::Parsed)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}", page.url, e);
            (Vec::new(), TaskState::ParseFailed)
        }
    };

    send(
        events,
        WorkerEvent::Finished {
            kind,
            fetched: true,
            state,
        },
    )
    .await;

    requests
}

/// Reports a task that was not fetched successfully
///
/// A rating task still owns the fields of its movie, so the movie is emitted
/// with the missing-rating sentinel instead of being lost.
async fn abandon(task: Task, state: TaskState, events: &mpsc::Sender<WorkerEvent>) {
    let kind = task.continuation.kind();

    if let Continuation::Rating(context) = task.continuation {
        tracing::debug!("Emitting '{}' without rating", context.title);
        send(events, WorkerEvent::Record(context.into_record(RATING_NOT_FOUND))).await;
    }

    send(
        events,
        WorkerEvent::Finished {
            kind,
            fetched: false,
            state,
        },
    )
    .await;
}

async fn send(events: &mpsc::Sender<WorkerEvent>, event: WorkerEvent) {
    // The receiver only goes away once every worker has returned
    if events.send(event).await.is_err() {
        tracing::error!("Coordinator stopped receiving worker events");
    }
}

/// Runs a complete crawl writing into the configured output
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wiki_movies::config::load_config_with_hash;
/// use wiki_movies::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let stats = run_crawl(config, &hash).await?;
/// println!("{} movies", stats.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlStats, MovieError> {
    let sink = open_sink(&config.output, config_hash)?;
    Coordinator::new(config, sink)?.run().await
}
