//! Record sink trait and output errors

use crate::output::CrawlStats;
use crate::spider::MovieRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Lifecycle status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Destination for finished movie records
///
/// Sinks are driven from a single task, so `&mut self` is enough; `Send` lets
/// the coordinator hold one across awaits.
pub trait RecordSink: Send {
    /// Persists one record
    fn write_record(&mut self, record: &MovieRecord) -> OutputResult<()>;

    /// Flushes buffered output and records the final run status
    fn finish(&mut self, stats: &CrawlStats, status: RunStatus) -> OutputResult<()>;
}
