//! JSON Lines output

use crate::output::traits::{OutputResult, RecordSink, RunStatus};
use crate::output::CrawlStats;
use crate::spider::MovieRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one JSON object per record, one record per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &MovieRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, stats: &CrawlStats, status: RunStatus) -> OutputResult<()> {
        self.writer.flush()?;
        tracing::debug!(
            "JSON Lines output closed ({} records, {})",
            stats.records,
            status.to_db_string()
        );
        Ok(())
    }
}
