//! User-facing log sink.
//!
//! The engine reports progress through a three-level sink of plain strings.
//! The embedding layer decides where those lines go: the CLI forwards them to
//! `tracing` ([`TracingSink`]), an embedding UI can receive them over a
//! channel ([`ChannelSink`]) and render them append-only on its own event
//! loop. Either way the worker treats the sink as fire-and-forget and never
//! waits on it.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Severity of a sink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Normal progress information.
    Info,
    /// Something degraded but the run continues.
    Warning,
    /// A failure worth the user's attention.
    Error,
}

/// One message on its way to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity.
    pub level: LogLevel,
    /// Plain display text.
    pub message: String,
}

/// Three-level message sink the engine writes plain strings to.
///
/// Implementations must be safe to call from the worker task and must not
/// block; delivery order must match call order.
pub trait LogSink: Send + Sync {
    /// Reports normal progress.
    fn info(&self, message: &str);
    /// Reports a degraded-but-continuing condition.
    fn warning(&self, message: &str);
    /// Reports a failure.
    fn error(&self, message: &str);
}

/// Sink that forwards messages to the `tracing` subscriber.
///
/// Used by the CLI so engine progress and diagnostics share one output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// Sink that delivers messages over an unbounded channel.
///
/// The sending side never blocks; a dropped receiver silently discards
/// further messages instead of failing the worker.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LogEvent>,
}

impl ChannelSink {
    /// Creates the sink and the receiving end the presentation layer drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, level: LogLevel, message: &str) {
        let _ = self.tx.send(LogEvent {
            level,
            message: message.to_string(),
        });
    }
}

impl LogSink for ChannelSink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
