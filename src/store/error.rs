//! Error types for library store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Uniqueness conflicts are not represented here: duplicate insertion is
/// handled with conditional inserts (`ON CONFLICT DO NOTHING`), so "already
/// known" never surfaces as an error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Track row not found.
    #[error("track not found: id {0}\n  Suggestion: run the playlist URL again to re-sync the library")]
    TrackNotFound(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
