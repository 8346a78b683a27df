//! SQLite output
//!
//! Each crawl opens a row in `runs`; every record lands in `movies` tagged
//! with that run. Re-running against the same database appends a new run.

use crate::output::traits::{OutputResult, RecordSink, RunStatus};
use crate::output::CrawlStats;
use crate::spider::{MovieRecord, RATING_NOT_FOUND};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQL schema for the output database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    records INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    title TEXT NOT NULL,
    genre TEXT NOT NULL,
    director TEXT NOT NULL,
    countries TEXT NOT NULL,
    year TEXT NOT NULL,
    rating TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_movies_run ON movies(run_id);
CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);
"#;

/// Summary of one stored run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub records: u64,
    pub rated_records: u64,
}

/// Writes records into a SQLite database
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path` and starts a new run
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Self::with_connection(conn, config_hash)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> OutputResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;

        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        let run_id = conn.last_insert_rowid();

        tracing::debug!("Started run {} in SQLite output", run_id);
        Ok(Self { conn, run_id })
    }

    /// The id of the run this sink writes into
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Summary of the run this sink writes into
    pub fn summary(&self) -> OutputResult<Option<RunSummary>> {
        query_run(&self.conn, Some(self.run_id))
    }
}

impl RecordSink for SqliteSink {
    fn write_record(&mut self, record: &MovieRecord) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO movies (run_id, title, genre, director, countries, year, rating, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.run_id,
                record.title,
                record.genre,
                record.director,
                record.countries,
                record.year,
                record.rating,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self, stats: &CrawlStats, status: RunStatus) -> OutputResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, records = ?3 WHERE id = ?4",
            params![
                status.to_db_string(),
                Utc::now().to_rfc3339(),
                stats.records as i64,
                self.run_id
            ],
        )?;
        Ok(())
    }
}

/// Reads the latest run from an existing output database
///
/// Returns `Ok(None)` if the database holds no runs.
pub fn load_run_summary(path: &Path) -> OutputResult<Option<RunSummary>> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA_SQL)?;
    query_run(&conn, None)
}

fn query_run(conn: &Connection, run_id: Option<i64>) -> OutputResult<Option<RunSummary>> {
    let run = conn
        .query_row(
            "SELECT id, started_at, finished_at, config_hash, status FROM runs
             WHERE ?1 IS NULL OR id = ?1
             ORDER BY id DESC LIMIT 1",
            params![run_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, started_at, finished_at, config_hash, status)) = run else {
        return Ok(None);
    };

    let records: i64 = conn.query_row(
        "SELECT COUNT(*) FROM movies WHERE run_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    let rated_records: i64 = conn.query_row(
        "SELECT COUNT(*) FROM movies WHERE run_id = ?1 AND rating != ?2",
        params![id, RATING_NOT_FOUND],
        |row| row.get(0),
    )?;

    Ok(Some(RunSummary {
        id,
        started_at,
        finished_at,
        config_hash,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Failed),
        records: records as u64,
        rated_records: rated_records as u64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spider::PendingMovieContext;
    use tempfile::TempDir;

    fn record(title: &str, rating: &str) -> MovieRecord {
        PendingMovieContext {
            title: title.to_string(),
            genre: "драма".to_string(),
            director: "Андрей Тарковский".to_string(),
            countries: "СССР".to_string(),
            year: "1972".to_string(),
        }
        .into_record(rating)
    }

    #[test]
    fn test_new_run_is_running() {
        let sink = SqliteSink::open_in_memory("abc123").unwrap();
        let summary = sink.summary().unwrap().unwrap();
        assert_eq!(summary.id, sink.run_id());
        assert_eq!(summary.status, RunStatus::Running);
        assert_eq!(summary.config_hash, "abc123");
        assert!(summary.finished_at.is_none());
    }

    #[test]
    fn test_records_and_finish() {
        let mut sink = SqliteSink::open_in_memory("abc123").unwrap();
        sink.write_record(&record("Солярис", "8.0")).unwrap();
        sink.write_record(&record("Зеркало", RATING_NOT_FOUND))
            .unwrap();

        let mut stats = CrawlStats::new();
        stats.records = 2;
        sink.finish(&stats, RunStatus::Completed).unwrap();

        let summary = sink.summary().unwrap().unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.rated_records, 1);
        assert!(summary.finished_at.is_some());
    }

    #[test]
    fn test_load_latest_run_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.db");

        {
            let mut first = SqliteSink::open(&path, "first").unwrap();
            first.write_record(&record("Солярис", "8.0")).unwrap();
            first.finish(&CrawlStats::new(), RunStatus::Completed).unwrap();
        }
        {
            let mut second = SqliteSink::open(&path, "second").unwrap();
            second.write_record(&record("Сталкер", "8.1")).unwrap();
            second.write_record(&record("Зеркало", "8.0")).unwrap();
            second.finish(&CrawlStats::new(), RunStatus::Failed).unwrap();
        }

        let summary = load_run_summary(&path).unwrap().unwrap();
        assert_eq!(summary.config_hash, "second");
        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.records, 2);
    }

    #[test]
    fn test_load_from_empty_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        assert!(load_run_summary(&path).unwrap().is_none());
    }
}
