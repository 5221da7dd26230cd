//! yt-dlp subprocess implementation of the extraction capability.
//!
//! Runs the `yt-dlp` binary with `--dump-single-json --flat-playlist` for
//! metadata probes and `--extract-audio` with codec/bitrate post-processing
//! for fetches. Fetch output is streamed line by line: destination paths are
//! scraped from `Destination:` lines (the tool's progress hook equivalent),
//! non-noise lines are relayed to the log sink, and the stderr tail becomes
//! the failure message when the tool exits non-zero.
//!
//! Children are spawned with `kill_on_drop` so a cancelled fetch future takes
//! the tool down with it.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{Extractor, ExtractorError, FetchOptions, FetchReport, ProbeOptions};

/// Program name looked up on PATH when no explicit binary is configured.
const DEFAULT_BINARY: &str = "yt-dlp";

/// How many trailing stderr lines survive into a failure message.
const STDERR_TAIL_LINES: usize = 3;

/// Lines announcing where the tool is writing, printed by the downloader and
/// by the audio-extraction post-processor.
#[allow(clippy::expect_used)]
static DESTINATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:download|ExtractAudio)\] Destination: (.+)$")
        .expect("destination regex is valid")
});

/// Line printed instead of a destination when the file was already on disk.
#[allow(clippy::expect_used)]
static ALREADY_DOWNLOADED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\] (.+) has already been downloaded")
        .expect("already-downloaded regex is valid")
});

/// Extracts the output path from a tool stdout line, when it carries one.
fn parse_destination(line: &str) -> Option<PathBuf> {
    if let Some(captures) = DESTINATION_PATTERN.captures(line) {
        return captures.get(1).map(|m| PathBuf::from(m.as_str()));
    }
    ALREADY_DOWNLOADED_PATTERN
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| PathBuf::from(m.as_str()))
}

/// True for high-frequency progress lines not worth relaying to the sink.
fn is_progress_noise(line: &str) -> bool {
    line.starts_with("[download]") && line.contains('%')
}

/// Condenses raw stderr into its last few non-empty lines.
fn stderr_excerpt(raw: &str) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn probe_args(url: &str, options: &ProbeOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--dump-single-json".into(),
        "--flat-playlist".into(),
        "--ignore-errors".into(),
        "--no-warnings".into(),
    ];
    if let Some(cookies) = &options.cookie_file {
        args.push("--cookies".into());
        args.push(cookies.as_os_str().to_owned());
    }
    args.push(url.into());
    args
}

fn fetch_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        "bestaudio/best".into(),
        "--no-playlist".into(),
        "--extract-audio".into(),
        "--audio-format".into(),
        options.audio_format.clone().into(),
        "--audio-quality".into(),
        options.audio_quality.clone().into(),
        "-o".into(),
        options.output_template.clone().into(),
        "--newline".into(),
    ];
    if options.embed_metadata {
        args.push("--embed-metadata".into());
    }
    if let Some(cookies) = &options.cookie_file {
        args.push("--cookies".into());
        args.push(cookies.as_os_str().to_owned());
    }
    args.push(url.into());
    args
}

/// [`Extractor`] backed by the yt-dlp command-line tool.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl YtDlpExtractor {
    /// Creates an extractor using `yt-dlp` from PATH.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
        }
    }

    /// Creates an extractor using an explicit binary path.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractorError {
        ExtractorError::Spawn {
            tool: self.binary.display().to_string(),
            source,
        }
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    #[instrument(skip(self, options), fields(url = %url))]
    async fn probe(
        &self,
        url: &str,
        options: &ProbeOptions,
    ) -> Result<serde_json::Value, ExtractorError> {
        let output = Command::new(&self.binary)
            .args(probe_args(url, options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            let excerpt = stderr_excerpt(&String::from_utf8_lossy(&output.stderr));
            let message = if excerpt.is_empty() {
                format!("yt-dlp exited with {}", output.status)
            } else {
                excerpt
            };
            return Err(ExtractorError::tool(message));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            ExtractorError::invalid_output(format!("metadata is not valid JSON: {e}"))
        })
    }

    #[instrument(skip(self, options), fields(url = %url))]
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchReport, ExtractorError> {
        let mut child = Command::new(&self.binary)
            .args(fetch_args(url, options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes concurrently so neither side can fill up and stall
        // the child. Stdout feeds the sink and the destination scan; stderr
        // feeds the sink as warnings and keeps a tail for the error message.
        let stdout_scan = async {
            let mut destination = None;
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(path) = parse_destination(&line) {
                        destination = Some(path);
                    }
                    if !line.trim().is_empty() && !is_progress_noise(&line) {
                        options.log.info(&line);
                    }
                }
            }
            destination
        };

        let stderr_scan = async {
            let mut tail: VecDeque<String> = VecDeque::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    options.log.warning(trimmed);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(trimmed.to_string());
                }
            }
            tail
        };

        let (destination, tail) = tokio::join!(stdout_scan, stderr_scan);

        let status = child.wait().await.map_err(|source| self.spawn_error(source))?;

        if status.success() {
            debug!(?destination, "fetch finished");
            Ok(FetchReport { destination })
        } else {
            let message = if tail.is_empty() {
                format!("yt-dlp exited with {status}")
            } else {
                Vec::from(tail).join("\n")
            };
            Err(ExtractorError::tool(message))
        }
    }
}
