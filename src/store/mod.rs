//! Library module for durable playlist and track state.
//!
//! This module provides the `SQLite`-backed record of every playlist ever
//! resolved and every track ever seen in one, so repeated runs resume where
//! the last one stopped instead of starting over.
//!
//! # Overview
//!
//! The library consists of:
//! - [`Library`] - Main interface for playlist/track persistence
//! - [`Playlist`] / [`Track`] - Row types
//! - [`TrackStatus`] - Track lifecycle states (pending → completed/error)
//! - [`SettingsStore`] - Flat key/value settings in the same database
//! - [`StoreError`] - Operation error types
//!
//! # Example
//!
//! ```no_run
//! use tunedl_core::{Database, Library};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("downloads.db")).await?;
//! let library = Library::new(db);
//!
//! let playlist_id = library
//!     .get_or_create_playlist("https://example.com/list", "Morning Mix")
//!     .await?;
//! let pending = library.pending_tracks(playlist_id).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod settings;
mod track;

pub use error::StoreError;
pub use settings::SettingsStore;
pub use track::{Playlist, Track, TrackStatus};

use crate::db::Database;
use crate::extractor::ItemDescriptor;
use sqlx::Row;
use tracing::{debug, instrument};

/// Maps an UPDATE that touched no rows to [`StoreError::TrackNotFound`].
fn require_row(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected > 0 {
        return Ok(());
    }
    Err(StoreError::TrackNotFound(id))
}

/// Title recorded when a descriptor carries none.
const DEFAULT_TRACK_TITLE: &str = "Unknown";

/// Canonical watch-URL prefix used when a descriptor supplies an id but no URL.
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Fields derived from a descriptor, ready for insertion.
struct NewTrack {
    external_id: Option<String>,
    title: String,
    url: String,
}

/// Derives the insertable fields from a descriptor.
///
/// Returns `None` when the descriptor is unusable: empty, or carrying
/// neither a URL nor an external id to build one from.
fn derive_new_track(descriptor: &ItemDescriptor) -> Option<NewTrack> {
    if descriptor.is_empty() {
        return None;
    }

    let external_id = descriptor
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned);

    let url = descriptor
        .best_url()
        .map(ToOwned::to_owned)
        .or_else(|| external_id.as_deref().map(|id| format!("{WATCH_URL_PREFIX}{id}")))?;

    let title = descriptor
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_TRACK_TITLE)
        .to_string();

    Some(NewTrack {
        external_id,
        title,
        url,
    })
}

/// Durable store of playlists and their tracks.
///
/// Provides conditional-insert reconciliation and per-track status updates
/// backed by `SQLite` with WAL mode. All mutation happens through explicit
/// single-statement operations; callers never see uniqueness conflicts.
#[derive(Debug, Clone)]
pub struct Library {
    db: Database,
}

impl Library {
    /// Creates a new library over the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the playlist id for a source URL, creating the row on first sight.
    ///
    /// The title is only recorded at creation; later calls with a different
    /// title do not rewrite it. Existing rows get their `last_updated`
    /// timestamp touched so the column reflects the latest reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the upsert fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_or_create_playlist(&self, url: &str, title: &str) -> Result<i64> {
        // Single atomic upsert: insert on first sight, touch last_updated after.
        let result = sqlx::query(
            r"INSERT INTO playlists (url, title)
              VALUES (?, ?)
              ON CONFLICT(url) DO UPDATE SET last_updated = datetime('now')
              RETURNING id",
        )
        .bind(url)
        .bind(title)
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("id"))
    }

    /// Looks up a playlist row by its source URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_playlist_by_url(&self, url: &str) -> Result<Option<Playlist>> {
        let playlist = sqlx::query_as::<_, Playlist>(r"SELECT * FROM playlists WHERE url = ?")
            .bind(url)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(playlist)
    }

    /// Inserts the descriptors not already known for this playlist.
    ///
    /// For each descriptor this derives an external id, a title (defaulting
    /// to `"Unknown"`), and a best-effort URL (falling back to the canonical
    /// watch URL built from the external id). Descriptors that are empty, or
    /// that carry neither a URL nor an id, are skipped. Already-known tracks
    /// (same `(playlist, external id)`, or same `(playlist, url)` when the
    /// descriptor has no id) are left untouched.
    ///
    /// Returns the number of rows actually inserted, for progress reporting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if an insert fails.
    #[instrument(skip(self, descriptors), fields(count = descriptors.len()))]
    pub async fn add_tracks(
        &self,
        playlist_id: i64,
        descriptors: &[ItemDescriptor],
    ) -> Result<u64> {
        let mut inserted = 0u64;

        for descriptor in descriptors {
            let Some(new_track) = derive_new_track(descriptor) else {
                debug!(?descriptor, "skipping unusable descriptor");
                continue;
            };

            let result = if new_track.external_id.is_some() {
                // Conditional insert: a known (playlist, external id) pair is a
                // no-op, not an error, and never refreshes existing metadata.
                sqlx::query(
                    r"INSERT INTO tracks (playlist_id, external_id, title, url, status)
                      VALUES (?, ?, ?, ?, ?)
                      ON CONFLICT(playlist_id, external_id) DO NOTHING",
                )
                .bind(playlist_id)
                .bind(new_track.external_id.as_deref())
                .bind(&new_track.title)
                .bind(&new_track.url)
                .bind(TrackStatus::Pending.as_str())
                .execute(self.db.pool())
                .await?
            } else {
                // No external id: identity degenerates to the constructed URL.
                sqlx::query(
                    r"INSERT INTO tracks (playlist_id, external_id, title, url, status)
                      SELECT ?, NULL, ?, ?, ?
                      WHERE NOT EXISTS (
                          SELECT 1 FROM tracks WHERE playlist_id = ? AND url = ?
                      )",
                )
                .bind(playlist_id)
                .bind(&new_track.title)
                .bind(&new_track.url)
                .bind(TrackStatus::Pending.as_str())
                .bind(playlist_id)
                .bind(&new_track.url)
                .execute(self.db.pool())
                .await?
            };

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Returns every track of the playlist that still needs work, in
    /// insertion order.
    ///
    /// Selects all tracks whose status is not `completed`: error tracks are
    /// considered retryable and come back on the next run without any manual
    /// requeue step. Completed tracks never reappear.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn pending_tracks(&self, playlist_id: i64) -> Result<Vec<Track>> {
        let tracks = sqlx::query_as::<_, Track>(
            r"SELECT * FROM tracks
              WHERE playlist_id = ? AND status != ?
              ORDER BY id ASC",
        )
        .bind(playlist_id)
        .bind(TrackStatus::Completed.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(tracks)
    }

    /// Unconditionally overwrites a track's status, error message, and file path.
    ///
    /// Idempotent: repeating the same update is harmless. Fields passed as
    /// `None` are cleared, not preserved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TrackNotFound`] if no track exists with the given ID.
    /// Returns [`StoreError::Database`] if the update fails.
    #[instrument(skip(self, error, file_path), fields(status = %status))]
    pub async fn update_status(
        &self,
        track_id: i64,
        status: TrackStatus,
        error: Option<&str>,
        file_path: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE tracks
              SET status = ?, last_error = ?, file_path = ?, updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error)
        .bind(file_path)
        .bind(track_id)
        .execute(self.db.pool())
        .await?;

        require_row(track_id, result.rows_affected())
    }

    /// Retrieves a track by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get_track(&self, track_id: i64) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>(r"SELECT * FROM tracks WHERE id = ?")
            .bind(track_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(track)
    }

    /// Retrieves a playlist's track by its external id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get_track_by_external_id(
        &self,
        playlist_id: i64,
        external_id: &str,
    ) -> Result<Option<Track>> {
        let track = sqlx::query_as::<_, Track>(
            r"SELECT * FROM tracks WHERE playlist_id = ? AND external_id = ?",
        )
        .bind(playlist_id)
        .bind(external_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(track)
    }

    /// Counts the playlist's tracks with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self), fields(status = %status))]
    pub async fn count_by_status(&self, playlist_id: i64, status: TrackStatus) -> Result<i64> {
        let result = sqlx::query(
            r"SELECT COUNT(*) as count FROM tracks WHERE playlist_id = ? AND status = ?",
        )
        .bind(playlist_id)
        .bind(status.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("count"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn test_library() -> Library {
        let db = Database::new_in_memory().await.unwrap();
        Library::new(db)
    }

    fn descriptor(id: &str, title: &str) -> ItemDescriptor {
        ItemDescriptor {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            url: Some(format!("https://example.com/watch?v={id}")),
            webpage_url: None,
        }
    }

    // ==================== Playlist Tests ====================

    #[tokio::test]
    async fn test_get_or_create_playlist_returns_same_id() {
        let library = test_library().await;

        let first = library
            .get_or_create_playlist("https://example.com/list", "Morning Mix")
            .await
            .unwrap();
        let second = library
            .get_or_create_playlist("https://example.com/list", "Morning Mix")
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_or_create_playlist_does_not_refresh_title() {
        let library = test_library().await;

        let id = library
            .get_or_create_playlist("https://example.com/list", "Original Title")
            .await
            .unwrap();
        let again = library
            .get_or_create_playlist("https://example.com/list", "Renamed Title")
            .await
            .unwrap();
        assert_eq!(id, again);

        let playlist = library
            .get_playlist_by_url("https://example.com/list")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(playlist.title, "Original Title");
    }

    #[tokio::test]
    async fn test_get_playlist_by_url_missing_returns_none() {
        let library = test_library().await;

        let playlist = library
            .get_playlist_by_url("https://example.com/nope")
            .await
            .unwrap();

        assert!(playlist.is_none());
    }

    #[tokio::test]
    async fn test_distinct_urls_create_distinct_playlists() {
        let library = test_library().await;

        let first = library
            .get_or_create_playlist("https://example.com/a", "A")
            .await
            .unwrap();
        let second = library
            .get_or_create_playlist("https://example.com/b", "B")
            .await
            .unwrap();

        assert_ne!(first, second);
    }

    // ==================== add_tracks Tests ====================

    #[tokio::test]
    async fn test_add_tracks_inserts_new_descriptors() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        let inserted = library
            .add_tracks(
                playlist_id,
                &[descriptor("a1", "First"), descriptor("a2", "Second")],
            )
            .await
            .unwrap();

        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn test_add_tracks_second_call_inserts_nothing() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        let descriptors = [descriptor("a1", "First"), descriptor("a2", "Second")];

        let first = library.add_tracks(playlist_id, &descriptors).await.unwrap();
        let second = library.add_tracks(playlist_id, &descriptors).await.unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_add_tracks_does_not_refresh_known_metadata() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        library
            .add_tracks(playlist_id, &[descriptor("a1", "Original")])
            .await
            .unwrap();
        library
            .add_tracks(playlist_id, &[descriptor("a1", "Renamed")])
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Original");
    }

    #[tokio::test]
    async fn test_add_tracks_defaults_missing_title() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        let inserted = library
            .add_tracks(
                playlist_id,
                &[ItemDescriptor {
                    id: Some("a1".to_string()),
                    title: None,
                    url: Some("https://example.com/watch?v=a1".to_string()),
                    webpage_url: None,
                }],
            )
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let pending = library.pending_tracks(playlist_id).await.unwrap();
        assert_eq!(pending[0].title, "Unknown");
    }

    #[tokio::test]
    async fn test_add_tracks_builds_watch_url_from_id() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        library
            .add_tracks(
                playlist_id,
                &[ItemDescriptor {
                    id: Some("a1".to_string()),
                    title: Some("No URL".to_string()),
                    url: None,
                    webpage_url: None,
                }],
            )
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();
        assert_eq!(pending[0].url, "https://www.youtube.com/watch?v=a1");
    }

    #[tokio::test]
    async fn test_add_tracks_prefers_webpage_url_over_fallback() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        library
            .add_tracks(
                playlist_id,
                &[ItemDescriptor {
                    id: Some("a1".to_string()),
                    title: Some("Page".to_string()),
                    url: None,
                    webpage_url: Some("https://example.com/page/a1".to_string()),
                }],
            )
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();
        assert_eq!(pending[0].url, "https://example.com/page/a1");
    }

    #[tokio::test]
    async fn test_add_tracks_skips_empty_descriptors() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        let inserted = library
            .add_tracks(
                playlist_id,
                &[ItemDescriptor::default(), descriptor("a1", "Real")],
            )
            .await
            .unwrap();

        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_add_tracks_skips_descriptor_without_id_or_url() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        let inserted = library
            .add_tracks(
                playlist_id,
                &[ItemDescriptor {
                    id: None,
                    title: Some("Title Only".to_string()),
                    url: None,
                    webpage_url: None,
                }],
            )
            .await
            .unwrap();

        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn test_add_tracks_without_id_dedupes_by_url() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        let no_id = ItemDescriptor {
            id: None,
            title: Some("Anonymous".to_string()),
            url: Some("https://example.com/direct.mp3".to_string()),
            webpage_url: None,
        };

        let first = library.add_tracks(playlist_id, &[no_id.clone()]).await.unwrap();
        let second = library.add_tracks(playlist_id, &[no_id]).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_add_tracks_same_id_different_playlists() {
        let library = test_library().await;
        let first_playlist = library
            .get_or_create_playlist("https://example.com/a", "A")
            .await
            .unwrap();
        let second_playlist = library
            .get_or_create_playlist("https://example.com/b", "B")
            .await
            .unwrap();

        let first = library
            .add_tracks(first_playlist, &[descriptor("a1", "Shared")])
            .await
            .unwrap();
        let second = library
            .add_tracks(second_playlist, &[descriptor("a1", "Shared")])
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
    }

    // ==================== pending_tracks Tests ====================

    #[tokio::test]
    async fn test_pending_tracks_excludes_completed_includes_error() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(
                playlist_id,
                &[
                    descriptor("a1", "Done"),
                    descriptor("a2", "Waiting"),
                    descriptor("a3", "Broken"),
                ],
            )
            .await
            .unwrap();
        let all = library.pending_tracks(playlist_id).await.unwrap();

        library
            .update_status(all[0].id, TrackStatus::Completed, None, Some("/tmp/a1.mp3"))
            .await
            .unwrap();
        library
            .update_status(all[2].id, TrackStatus::Error, Some("boom"), None)
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();
        let titles: Vec<&str> = pending.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Waiting", "Broken"]);
    }

    #[tokio::test]
    async fn test_pending_tracks_keeps_insertion_order() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(
                playlist_id,
                &[
                    descriptor("z9", "First In"),
                    descriptor("a1", "Second In"),
                    descriptor("m5", "Third In"),
                ],
            )
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();
        let titles: Vec<&str> = pending.iter().map(|t| t.title.as_str()).collect();

        assert_eq!(titles, vec!["First In", "Second In", "Third In"]);
    }

    #[tokio::test]
    async fn test_pending_tracks_empty_playlist() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();

        let pending = library.pending_tracks(playlist_id).await.unwrap();

        assert!(pending.is_empty());
    }

    // ==================== update_status Tests ====================

    #[tokio::test]
    async fn test_update_status_records_completion() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(playlist_id, &[descriptor("a1", "Song")])
            .await
            .unwrap();
        let track_id = library.pending_tracks(playlist_id).await.unwrap()[0].id;

        library
            .update_status(
                track_id,
                TrackStatus::Completed,
                None,
                Some("/music/Song [a1].mp3"),
            )
            .await
            .unwrap();

        let track = library.get_track(track_id).await.unwrap().unwrap();
        assert_eq!(track.status(), TrackStatus::Completed);
        assert_eq!(track.file_path.as_deref(), Some("/music/Song [a1].mp3"));
        assert!(track.last_error.is_none());
    }

    #[tokio::test]
    async fn test_update_status_is_idempotent() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(playlist_id, &[descriptor("a1", "Song")])
            .await
            .unwrap();
        let track_id = library.pending_tracks(playlist_id).await.unwrap()[0].id;

        for _ in 0..2 {
            library
                .update_status(track_id, TrackStatus::Error, Some("404"), None)
                .await
                .unwrap();
        }

        let track = library.get_track(track_id).await.unwrap().unwrap();
        assert_eq!(track.status(), TrackStatus::Error);
        assert_eq!(track.last_error.as_deref(), Some("404"));
    }

    #[tokio::test]
    async fn test_update_status_overwrites_previous_error() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(playlist_id, &[descriptor("a1", "Song")])
            .await
            .unwrap();
        let track_id = library.pending_tracks(playlist_id).await.unwrap()[0].id;

        library
            .update_status(track_id, TrackStatus::Error, Some("timeout"), None)
            .await
            .unwrap();
        library
            .update_status(track_id, TrackStatus::Completed, None, Some("/music/a1.mp3"))
            .await
            .unwrap();

        let track = library.get_track(track_id).await.unwrap().unwrap();
        assert_eq!(track.status(), TrackStatus::Completed);
        assert!(track.last_error.is_none(), "error should be cleared, not kept");
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_fails() {
        let library = test_library().await;

        let result = library
            .update_status(9999, TrackStatus::Completed, None, None)
            .await;

        assert!(matches!(result, Err(StoreError::TrackNotFound(9999))));
    }

    // ==================== count/get Tests ====================

    #[tokio::test]
    async fn test_count_by_status() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(
                playlist_id,
                &[descriptor("a1", "One"), descriptor("a2", "Two")],
            )
            .await
            .unwrap();
        let pending = library.pending_tracks(playlist_id).await.unwrap();
        library
            .update_status(pending[0].id, TrackStatus::Completed, None, None)
            .await
            .unwrap();

        assert_eq!(
            library
                .count_by_status(playlist_id, TrackStatus::Completed)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            library
                .count_by_status(playlist_id, TrackStatus::Pending)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            library
                .count_by_status(playlist_id, TrackStatus::Error)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_get_track_missing_returns_none() {
        let library = test_library().await;

        let track = library.get_track(12345).await.unwrap();

        assert!(track.is_none());
    }

    #[tokio::test]
    async fn test_get_track_by_external_id() {
        let library = test_library().await;
        let playlist_id = library
            .get_or_create_playlist("https://example.com/list", "Mix")
            .await
            .unwrap();
        library
            .add_tracks(
                playlist_id,
                &[descriptor("a1", "One"), descriptor("a2", "Two")],
            )
            .await
            .unwrap();

        let track = library
            .get_track_by_external_id(playlist_id, "a2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(track.title, "Two");

        let missing = library
            .get_track_by_external_id(playlist_id, "nope")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
