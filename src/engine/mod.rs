//! Download engine: reconciles a playlist against the library and drives
//! pending tracks to a terminal status one at a time.
//!
//! # Overview
//!
//! A run has two phases. Reconciliation resolves the URL through the
//! [`Resolver`], upserts the playlist row, and inserts descriptors that are
//! not already tracked. The driver phase then walks every pending track in
//! insertion order: it skips tracks whose audio already exists on disk,
//! honors the run-scoped rate-limit cool-down, and fetches each remaining
//! track with a capped number of attempts. Failures on one track never
//! abort the run.
//!
//! The loop is deliberately sequential. Downloads are paced with a
//! randomized delay so the tool behaves like a person working through a
//! playlist, not a scraper hammering the service.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tunedl_core::Database;
//! use tunedl_core::config::EngineConfig;
//! use tunedl_core::engine::{DownloadEngine, DriverPolicy};
//! use tunedl_core::extractor::YtDlpExtractor;
//! use tunedl_core::store::Library;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let library = Library::new(db);
//! let source = Arc::new(YtDlpExtractor::new());
//! let engine = DownloadEngine::new(
//!     library,
//!     source,
//!     EngineConfig::default(),
//!     DriverPolicy::default(),
//! );
//! let stats = engine.run("https://www.youtube.com/playlist?list=PL123").await?;
//! println!("completed: {}, failed: {}", stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

pub mod retry;
pub mod session;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::extractor::{Extractor, FetchOptions, ProbeOptions};
use crate::guard;
use crate::logsink::{LogSink, TracingSink};
use crate::report::ReportWriter;
use crate::resolver::{ResolveError, Resolver};
use crate::store::{Library, StoreError, Track, TrackStatus};

pub use retry::{DriverPolicy, FailureKind, classify_failure};
pub use session::SessionControl;

/// Error type for engine operations.
///
/// Only resolution and store failures abort a run; everything that goes
/// wrong with a single track is recorded on that track instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The playlist or video metadata could not be resolved.
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A library read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Statistics from one engine run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    new_tracks: u64,
    completed: usize,
    failed: usize,
    skipped_existing: usize,
    deferred: usize,
    stopped: bool,
}

impl RunStats {
    /// Number of tracks inserted during reconciliation.
    #[must_use]
    pub fn new_tracks(&self) -> u64 {
        self.new_tracks
    }

    /// Number of tracks downloaded and marked completed this run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of tracks that exhausted their attempts and were marked
    /// as errors.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of tracks completed without downloading because their audio
    /// was already on disk.
    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.skipped_existing
    }

    /// Number of tracks left pending after a rate-limit signal.
    #[must_use]
    pub fn deferred(&self) -> usize {
        self.deferred
    }

    /// True if the run ended early because a stop was requested.
    #[must_use]
    pub fn was_stopped(&self) -> bool {
        self.stopped
    }

    /// Total tracks brought to a terminal status this run.
    #[must_use]
    pub fn total_settled(&self) -> usize {
        self.completed + self.failed + self.skipped_existing
    }
}

/// How one track left the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackOutcome {
    Completed,
    Failed,
    Throttled,
    Stopped,
}

/// Rewrites a reported destination's extension to the target codec.
///
/// The tool reports the path of the raw download; transcoding then replaces
/// the extension, so the recorded path must point at the file that actually
/// ends up on disk.
fn final_audio_path(mut path: std::path::PathBuf, audio_format: &str) -> std::path::PathBuf {
    path.set_extension(audio_format);
    path
}

/// Drives playlist reconciliation and sequential downloads.
///
/// The engine owns the library handle and the extraction tool, and exposes a
/// [`SessionControl`] handle so a signal handler or UI can stop a run from
/// another task. One engine can serve many runs; each run resets the
/// session state first.
pub struct DownloadEngine {
    library: Library,
    source: Arc<dyn Extractor>,
    resolver: Resolver,
    config: EngineConfig,
    policy: DriverPolicy,
    control: Arc<SessionControl>,
    log: Arc<dyn LogSink>,
    report: Option<ReportWriter>,
}

impl DownloadEngine {
    /// Creates an engine over a library and an extraction tool.
    ///
    /// Logs go to the tracing subscriber unless [`Self::with_log_sink`]
    /// installs another sink; no report is written unless
    /// [`Self::with_report`] provides one.
    #[must_use]
    pub fn new(
        library: Library,
        source: Arc<dyn Extractor>,
        config: EngineConfig,
        policy: DriverPolicy,
    ) -> Self {
        let probe_options = ProbeOptions {
            cookie_file: config.cookie_file().map(std::path::Path::to_path_buf),
        };
        let resolver = Resolver::new(Arc::clone(&source), probe_options);

        Self {
            library,
            source,
            resolver,
            config,
            policy,
            control: Arc::new(SessionControl::new()),
            log: Arc::new(TracingSink),
            report: None,
        }
    }

    /// Replaces the destination for user-facing progress messages.
    #[must_use]
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Enables the per-track CSV report.
    #[must_use]
    pub fn with_report(mut self, report: ReportWriter) -> Self {
        self.report = Some(report);
        self
    }

    /// Returns a handle for requesting a stop from another task.
    #[must_use]
    pub fn control(&self) -> Arc<SessionControl> {
        Arc::clone(&self.control)
    }

    /// Reconciles the URL against the library and downloads every pending
    /// track.
    ///
    /// Individual track failures are recorded on the track and counted in
    /// the returned [`RunStats`]; they do not abort the run. A stop request
    /// takes effect within about a second wherever the run happens to be
    /// waiting, and leaves unfinished tracks pending for the next run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Resolve`] if the URL cannot be resolved and
    /// [`EngineError::Store`] if a library operation fails. Both are fatal
    /// to the run.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn run(&self, url: &str) -> Result<RunStats, EngineError> {
        self.control.reset();
        let mut stats = RunStats::default();

        self.log.info(&format!("resolving {url}"));
        let resolved = tokio::select! {
            result = self.resolver.resolve(url) => result?,
            () = self.control.wait_for_stop() => {
                self.log.info("stopped before resolution finished");
                stats.stopped = true;
                return Ok(stats);
            }
        };

        let playlist_id = self
            .library
            .get_or_create_playlist(url, &resolved.title)
            .await?;
        stats.new_tracks = self
            .library
            .add_tracks(playlist_id, &resolved.entries)
            .await?;
        if stats.new_tracks > 0 {
            self.log
                .info(&format!("{} new track(s) queued", stats.new_tracks));
        } else {
            self.log.info("no new tracks; resuming pending work");
        }

        let pending = self.library.pending_tracks(playlist_id).await?;
        if pending.is_empty() {
            self.log.info("nothing to download");
            return Ok(stats);
        }
        info!(
            playlist_id,
            pending = pending.len(),
            "starting download pass"
        );

        let options = self.fetch_options();
        let total = pending.len();

        for (index, track) in pending.iter().enumerate() {
            if self.control.stop_requested() {
                self.log
                    .info("stop requested; leaving remaining tracks pending");
                stats.stopped = true;
                break;
            }
            let position = index + 1;

            // Duplicate guard: heal rows whose audio already exists on disk,
            // e.g. after a database swap or a previous run with a different
            // database file.
            if let Some(found) = self.find_on_disk(track) {
                self.log.info(&format!(
                    "[{position}/{total}] already on disk: {}",
                    track.title
                ));
                let path = found.to_string_lossy();
                self.library
                    .update_status(track.id, TrackStatus::Completed, None, Some(&path))
                    .await?;
                stats.skipped_existing += 1;
                self.write_report_row("skipped", track, None);
                continue;
            }

            // Honor a cool-down armed by an earlier throttle signal before
            // touching the service again.
            if let Some(remaining) = self.control.cooldown_remaining() {
                self.log.info(&format!(
                    "rate-limit cool-down: waiting {}s",
                    remaining.as_secs()
                ));
                if !self.control.wait_out_cooldown().await {
                    self.log
                        .info("stop requested; leaving remaining tracks pending");
                    stats.stopped = true;
                    break;
                }
            }

            self.log.info(&format!(
                "[{position}/{total}] downloading: {}",
                track.title
            ));
            match self.download_track(track, &options).await? {
                TrackOutcome::Completed => stats.completed += 1,
                TrackOutcome::Failed => stats.failed += 1,
                TrackOutcome::Throttled => {
                    // Left pending; the cool-down gate above spaces out the
                    // next track. No pacing on top of the cool-down.
                    stats.deferred += 1;
                    continue;
                }
                TrackOutcome::Stopped => {
                    self.log
                        .info("stop requested; leaving remaining tracks pending");
                    stats.stopped = true;
                    break;
                }
            }

            // Randomized pause between tracks so the run does not hit the
            // service in a tight loop.
            if position < total {
                let pause = self.policy.pacing_delay();
                debug!(pause_ms = pause.as_millis(), "pacing before next track");
                if !self.control.sleep_cancellable(pause).await {
                    self.log
                        .info("stop requested; leaving remaining tracks pending");
                    stats.stopped = true;
                    break;
                }
            }
        }

        info!(
            completed = stats.completed,
            failed = stats.failed,
            skipped_existing = stats.skipped_existing,
            deferred = stats.deferred,
            stopped = stats.stopped,
            "download pass finished"
        );
        Ok(stats)
    }

    /// Builds the fetch options shared by every track in a run.
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            output_template: self.config.output_template(),
            audio_format: self.config.audio_format().to_string(),
            audio_quality: self.config.bitrate().to_string(),
            cookie_file: self.config.cookie_file().map(std::path::Path::to_path_buf),
            embed_metadata: true,
            log: Arc::clone(&self.log),
        }
    }

    /// Scans the output directory for audio already belonging to this track.
    ///
    /// An unreadable output directory is logged and treated as "nothing
    /// found" so the download itself can still surface the real problem.
    fn find_on_disk(&self, track: &Track) -> Option<std::path::PathBuf> {
        let external_id = track.external_id.as_deref()?;
        if external_id.is_empty() {
            return None;
        }

        match guard::find_existing_audio(self.config.output_dir(), external_id) {
            Ok(found) => found,
            Err(error) => {
                warn!(
                    dir = %self.config.output_dir().display(),
                    %error,
                    "could not scan output directory"
                );
                None
            }
        }
    }

    /// Fetches one track, retrying transient failures up to the attempt cap.
    ///
    /// Terminal outcomes update the track row and the report; a throttle
    /// signal arms the session cool-down and leaves the row pending.
    #[instrument(skip(self, track, options), fields(track_id = track.id, url = %track.url))]
    async fn download_track(
        &self,
        track: &Track,
        options: &FetchOptions,
    ) -> Result<TrackOutcome, EngineError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts = self.policy.max_attempts(), "attempting download");

            let fetched = tokio::select! {
                result = self.source.fetch(&track.url, options) => result,
                () = self.control.wait_for_stop() => return Ok(TrackOutcome::Stopped),
            };

            let error = match fetched {
                Ok(report) => {
                    let path = report
                        .destination
                        .map(|p| final_audio_path(p, &options.audio_format))
                        .map(|p| p.to_string_lossy().into_owned());
                    self.library
                        .update_status(track.id, TrackStatus::Completed, None, path.as_deref())
                        .await?;
                    self.log.info(&format!("completed: {}", track.title));
                    self.write_report_row("completed", track, None);
                    return Ok(TrackOutcome::Completed);
                }
                Err(error) => error,
            };

            match classify_failure(&error) {
                FailureKind::Throttled => {
                    let cooldown = self.policy.cooldown();
                    self.log.warning(&format!(
                        "rate limited by the service; cooling down for {}s",
                        cooldown.as_secs()
                    ));
                    self.control.begin_cooldown(cooldown);
                    return Ok(TrackOutcome::Throttled);
                }
                FailureKind::Transient => {
                    if attempt >= self.policy.max_attempts() {
                        let message = error.to_string();
                        self.library
                            .update_status(track.id, TrackStatus::Error, Some(&message), None)
                            .await?;
                        self.log.error(&format!(
                            "failed after {attempt} attempts: {}: {message}",
                            track.title
                        ));
                        self.write_report_row("error", track, Some(&message));
                        return Ok(TrackOutcome::Failed);
                    }

                    let delay = self.policy.retry_delay();
                    self.log.warning(&format!(
                        "attempt {attempt} failed ({error}); retrying in {}s",
                        delay.as_secs()
                    ));
                    if !self.control.sleep_cancellable(delay).await {
                        return Ok(TrackOutcome::Stopped);
                    }
                }
            }
        }
    }

    /// Appends one row to the report, if a report is configured.
    /// Report failures are logged, never fatal.
    fn write_report_row(&self, status: &str, track: &Track, error: Option<&str>) {
        if let Some(report) = &self.report {
            if let Err(report_error) = report.record(status, &track.title, &track.url, error) {
                warn!(error = %report_error, "could not append to report");
            }
        }
    }
}
