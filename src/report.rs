//! CSV run report: one row per track that reached a terminal status.
//!
//! The report is append-only so repeated runs against the same file build a
//! history. Headers are written only when the file is new or empty. Every
//! row is flushed as soon as it is written; a crash mid-run loses at most
//! the row being written.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::SecondsFormat;
use csv::Writer;

/// Column headers for a fresh report file.
const HEADERS: [&str; 5] = ["timestamp", "status", "title", "url", "error"];

/// Error type for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report file could not be opened or inspected.
    #[error("could not open report file: {0}")]
    Io(#[from] io::Error),

    /// A row could not be encoded or written.
    #[error("could not write report row: {0}")]
    Csv(#[from] csv::Error),
}

/// Appends terminal-status rows to a CSV file.
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    writer: Mutex<Writer<File>>,
}

impl ReportWriter {
    /// Opens the report at `path` in append mode, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if the file cannot be opened and
    /// [`ReportError::Csv`] if the header row cannot be written.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = Writer::from_writer(file);
        if is_empty {
            writer.write_record(HEADERS)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Path the report is being written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row stamped with the current UTC time and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] if the row cannot be written or flushed.
    pub fn record(
        &self,
        status: &str,
        title: &str,
        url: &str,
        error: Option<&str>,
    ) -> Result<(), ReportError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.write_record([
            timestamp.as_str(),
            status,
            title,
            url,
            error.unwrap_or(""),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
