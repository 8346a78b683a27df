//! Output module for movie records and crawl statistics
//!
//! This module handles:
//! - Writing records as JSON Lines or into SQLite
//! - Collecting and printing crawl statistics
//! - Reading back the summary of a stored run

mod jsonl;
mod sqlite;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use sqlite::{load_run_summary, RunSummary, SqliteSink, SCHEMA_SQL};
pub use stats::{print_run_summary, print_statistics, CrawlStats};
pub use traits::{OutputError, OutputResult, RecordSink, RunStatus};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink selected by the output configuration
///
/// `config_hash` identifies the configuration in the SQLite `runs` table.
pub fn open_sink(config: &OutputConfig, config_hash: &str) -> OutputResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.path);

    let sink: Box<dyn RecordSink> = match config.format {
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path, config_hash)?),
    };

    tracing::info!("Writing {} output to {}", config.format, config.path);
    Ok(sink)
}
