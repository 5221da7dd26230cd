//! Row types for the library: playlists, their tracks, and the download
//! status lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Waiting to be downloaded (or eligible for another try).
    Pending,
    /// Successfully downloaded and post-processed.
    Completed,
    /// Failed after all attempts were exhausted.
    Error,
}

impl TrackStatus {
    /// The string form stored in the `status` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TrackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            _ => Err(format!("invalid track status: {s}")),
        }
    }
}

/// A playlist row: one per source URL ever resolved.
#[derive(Debug, Clone, FromRow)]
pub struct Playlist {
    /// Database row id.
    pub id: i64,
    /// Source URL; unique key for lookups across runs.
    pub url: String,
    /// Display title captured at first resolution.
    pub title: String,
    /// When the playlist was first recorded.
    pub created_at: String,
    /// When the playlist was last reconciled.
    pub last_updated: String,
}

/// A single downloadable track belonging to a playlist.
#[derive(Debug, Clone, FromRow)]
pub struct Track {
    /// Database row id.
    pub id: i64,
    /// Owning playlist.
    pub playlist_id: i64,
    /// Identifier assigned by the external service, when known.
    pub external_id: Option<String>,
    /// Display title ("Unknown" when the descriptor had none).
    pub title: String,
    /// URL handed to the download tool.
    pub url: String,
    /// Raw status column; use [`Track::status`] for the enum.
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Error text from the most recent failed attempt.
    pub last_error: Option<String>,
    /// Final file path once the track completed.
    pub file_path: Option<String>,
    /// When the track was first recorded.
    pub created_at: String,
    /// Timestamp of the last status change.
    pub updated_at: String,
}

impl Track {
    /// Current status, parsed from the stored string.
    ///
    /// Unrecognized strings degrade to `Pending`.
    #[must_use]
    pub fn status(&self) -> TrackStatus {
        self.status_str.parse().unwrap_or(TrackStatus::Pending)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track {{ id: {}, title: {}, status: {} }}",
            self.id,
            self.title,
            self.status()
        )
    }
}
