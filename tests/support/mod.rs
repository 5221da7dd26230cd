//! Shared test support: a scripted extractor and database helpers.
//!
//! Each integration test binary compiles this module on its own, so not
//! every helper is used by every binary.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tunedl_core::Database;
use tunedl_core::extractor::{Extractor, ExtractorError, FetchOptions, FetchReport, ProbeOptions};

/// Creates a file-backed test database in a temp directory.
///
/// # Errors
///
/// Returns error if temp directory or database creation fails.
pub async fn setup_test_db() -> Result<(Database, TempDir), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path).await?;

    Ok((db, temp_dir))
}

/// Builds playlist metadata in the flat shape the probe returns.
pub fn playlist_metadata(title: &str, ids: &[&str]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "title": format!("Track {id}"),
                "url": format!("https://www.youtube.com/watch?v={id}"),
            })
        })
        .collect();
    serde_json::json!({ "title": title, "entries": entries })
}

/// Extractor whose probe metadata and fetch results are scripted up front.
///
/// Fetch results are consumed in order; once the script runs out, further
/// fetches succeed with no reported destination. Call times are recorded so
/// tests can assert on pacing and cool-down gaps.
pub struct MockExtractor {
    metadata: serde_json::Value,
    fetch_script: Mutex<VecDeque<Result<FetchReport, ExtractorError>>>,
    fetch_calls: AtomicUsize,
    fetch_times: Mutex<Vec<Instant>>,
    fetch_delay: Duration,
}

impl MockExtractor {
    pub fn new(metadata: serde_json::Value) -> Self {
        Self {
            metadata,
            fetch_script: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
            fetch_times: Mutex::new(Vec::new()),
            fetch_delay: Duration::ZERO,
        }
    }

    /// Makes every fetch take at least `delay` before resolving.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Queues a successful fetch reporting `destination`.
    pub fn push_ok(self, destination: &str) -> Self {
        self.fetch_script.lock().unwrap().push_back(Ok(FetchReport {
            destination: Some(PathBuf::from(destination)),
        }));
        self
    }

    /// Queues a failed fetch with the given tool message.
    pub fn push_tool_error(self, message: &str) -> Self {
        self.fetch_script
            .lock()
            .unwrap()
            .push_back(Err(ExtractorError::tool(message)));
        self
    }

    /// Number of fetch calls made so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Instants at which each fetch call arrived.
    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn probe(
        &self,
        _url: &str,
        _options: &ProbeOptions,
    ) -> Result<serde_json::Value, ExtractorError> {
        Ok(self.metadata.clone())
    }

    async fn fetch(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> Result<FetchReport, ExtractorError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_times.lock().unwrap().push(Instant::now());

        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        let next = self.fetch_script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(FetchReport { destination: None }),
        }
    }
}
