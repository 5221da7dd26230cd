//! Flat key/value settings persisted alongside the library.
//!
//! The engine never reads this store; the surrounding application loads it
//! to build the engine configuration and writes back whatever the user
//! overrides.

use std::collections::HashMap;

use sqlx::Row;
use tracing::instrument;

use super::Result;
use crate::db::Database;

/// String-keyed settings store backed by the shared database.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    db: Database,
}

impl SettingsStore {
    /// Creates a settings store over the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Loads every stored setting into a map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`](super::StoreError::Database) if the query fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query(r"SELECT key, value FROM settings")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    /// Returns a single setting value, if present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`](super::StoreError::Database) if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(r"SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Stores a setting, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`](super::StoreError::Database) if the upsert fails.
    #[instrument(skip(self, value))]
    pub async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"INSERT INTO settings (key, value)
              VALUES (?, ?)
              ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn test_settings() -> SettingsStore {
        let db = Database::new_in_memory().await.unwrap();
        SettingsStore::new(db)
    }

    #[tokio::test]
    async fn test_settings_load_empty() {
        let settings = test_settings().await;

        let map = settings.load().await.unwrap();

        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_settings_save_and_load() {
        let settings = test_settings().await;

        settings.save("format", "mp3").await.unwrap();
        settings.save("bitrate", "192").await.unwrap();

        let map = settings.load().await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("format").map(String::as_str), Some("mp3"));
        assert_eq!(map.get("bitrate").map(String::as_str), Some("192"));
    }

    #[tokio::test]
    async fn test_settings_save_replaces_value() {
        let settings = test_settings().await;

        settings.save("format", "mp3").await.unwrap();
        settings.save("format", "m4a").await.unwrap();

        assert_eq!(settings.get("format").await.unwrap().as_deref(), Some("m4a"));
    }

    #[tokio::test]
    async fn test_settings_get_missing_returns_none() {
        let settings = test_settings().await;

        assert!(settings.get("nope").await.unwrap().is_none());
    }
}
