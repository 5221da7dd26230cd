//! tunedl Core Library
//!
//! This library implements the engine behind the tunedl tool, which keeps a
//! local audio collection in sync with playlists and single videos: resolve
//! a URL to its tracks, remember them in SQLite, and download whatever is
//! still pending through an external extraction tool.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`db`] - SQLite pool and embedded schema migrations
//! - [`store`] - Playlist, track, and settings persistence
//! - [`resolver`] - Flat metadata normalization into track descriptors
//! - [`extractor`] - Interface to the external extraction tool (yt-dlp)
//! - [`engine`] - Reconciliation and the sequential download driver
//! - [`guard`] - Duplicate detection against files already on disk
//! - [`report`] - Per-track CSV run reports
//! - [`logsink`] - Pluggable destination for user-facing progress messages
//! - [`config`] - Output location and encoding options

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod db;
pub mod engine;
pub mod extractor;
pub mod guard;
pub mod logsink;
pub mod report;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use config::EngineConfig;
pub use db::Database;
pub use engine::{
    DownloadEngine, DriverPolicy, EngineError, FailureKind, RunStats, SessionControl,
    classify_failure,
};
pub use extractor::{
    Extractor, ExtractorError, FetchOptions, FetchReport, ItemDescriptor, ProbeOptions,
    YtDlpExtractor,
};
pub use guard::{AUDIO_EXTENSIONS, find_existing_audio};
pub use logsink::{ChannelSink, LogEvent, LogLevel, LogSink, TracingSink};
pub use report::{ReportError, ReportWriter};
pub use resolver::{ResolveError, ResolvedPlaylist, Resolver};
pub use store::{Library, Playlist, SettingsStore, StoreError, Track, TrackStatus};
