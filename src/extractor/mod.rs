//! External extraction/download capability boundary.
//!
//! Everything that touches the actual media service goes through the
//! [`Extractor`] trait: a metadata probe that must not download any media,
//! and a per-item fetch that produces an audio file on disk. The production
//! implementation shells out to yt-dlp ([`YtDlpExtractor`]); tests script the
//! trait directly.
//!
//! Probe results come back as raw JSON ([`serde_json::Value`]) because the
//! tool reports two different shapes (a single item, or a collection with an
//! `entries` array); the resolver owns normalizing that variability.

mod ytdlp;

pub use ytdlp::YtDlpExtractor;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::logsink::LogSink;

/// One addressable item as reported by the metadata probe.
///
/// All fields are optional: flat extractions routinely omit some of them,
/// and the store derives fallbacks (default title, canonical watch URL) for
/// whatever is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemDescriptor {
    /// Identifier assigned by the external service.
    pub id: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Direct URL, when the probe supplied one.
    pub url: Option<String>,
    /// Web page URL, when the probe supplied one.
    pub webpage_url: Option<String>,
}

impl ItemDescriptor {
    /// Returns true when the descriptor carries no usable field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.url.is_none()
            && self.webpage_url.is_none()
    }

    /// Returns the best URL the descriptor offers: direct first, page second.
    #[must_use]
    pub fn best_url(&self) -> Option<&str> {
        self.url.as_deref().or(self.webpage_url.as_deref())
    }
}

/// Options for the metadata probe.
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// Cookie file handed to the tool for age/region-restricted sources.
    pub cookie_file: Option<PathBuf>,
}

/// Options for a single item fetch.
#[derive(Clone)]
pub struct FetchOptions {
    /// Output path template in the tool's own placeholder language. Always
    /// ends with ` [%(id)s].%(ext)s` so finished files embed the item id.
    pub output_template: String,
    /// Target audio codec for transcoding (mp3, m4a, ...).
    pub audio_format: String,
    /// Target bitrate in kbit/s, as the tool expects it ("192").
    pub audio_quality: String,
    /// Cookie file handed to the tool.
    pub cookie_file: Option<PathBuf>,
    /// Whether to run the metadata-tagging post-processing step.
    pub embed_metadata: bool,
    /// Sink receiving the tool's own progress/diagnostic lines.
    pub log: Arc<dyn LogSink>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("output_template", &self.output_template)
            .field("audio_format", &self.audio_format)
            .field("audio_quality", &self.audio_quality)
            .field("cookie_file", &self.cookie_file)
            .field("embed_metadata", &self.embed_metadata)
            .finish_non_exhaustive()
    }
}

/// What a completed fetch reported back.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Destination path the tool last reported, when it printed one.
    /// Post-processing may still rewrite the extension afterwards.
    pub destination: Option<PathBuf>,
}

/// Errors raised by the extraction/download capability.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The external tool could not be started at all.
    #[error("failed to launch '{tool}': {source}")]
    Spawn {
        /// Program name or path that failed to start.
        tool: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported a failure. The message is the material the
    /// driver classifies (throttle signatures vs. everything else).
    #[error("{message}")]
    Tool {
        /// Failure text assembled from the tool's stderr.
        message: String,
    },

    /// The tool produced output this side could not understand.
    #[error("invalid tool output: {message}")]
    InvalidOutput {
        /// What was wrong with the output.
        message: String,
    },
}

impl ExtractorError {
    /// Creates a `Tool` error from the tool's failure text.
    #[must_use]
    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool {
            message: message.into(),
        }
    }

    /// Creates an `InvalidOutput` error.
    #[must_use]
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            message: message.into(),
        }
    }
}

/// The external capability the engine drives.
///
/// Object-safe so the engine can hold `Arc<dyn Extractor>` and tests can
/// substitute a scripted double.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetches flat metadata for a URL. Must not download any media.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractorError`] when the URL cannot be resolved.
    async fn probe(
        &self,
        url: &str,
        options: &ProbeOptions,
    ) -> Result<serde_json::Value, ExtractorError>;

    /// Downloads one item's best audio and post-processes it per the options.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractorError`] when the download or post-processing
    /// fails; the error text drives retry/throttle classification.
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchReport, ExtractorError>;
}
