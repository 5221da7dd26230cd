//! SQLite backing store for the track library.
//!
//! Everything persistent (playlists, tracks, settings) lives in one SQLite
//! file reached through a small connection pool. The schema is created and
//! upgraded by migrations embedded at compile time, so callers never issue
//! DDL themselves. File-backed databases run in WAL mode so status updates
//! written mid-download do not block readers.
//!
//! # Example
//!
//! ```no_run
//! use tunedl_core::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("downloads.db")).await?;
//! // Hand clones of `db` to the stores, then:
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::instrument;

/// Connections kept in the pool. SQLite serializes writers anyway, so a
/// handful is plenty for a single desktop process.
const POOL_SIZE: u32 = 5;

/// How long a connection waits on a locked database before giving up
/// with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while opening or preparing the database.
#[derive(Error, Debug)]
pub enum DbError {
    /// The database could not be opened or queried.
    #[error("database connection failed: {0}")]
    Connection(#[from] sqlx::Error),

    /// An embedded migration failed to apply.
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Shared handle to the SQLite pool.
///
/// Cloning is cheap; every clone talks to the same pool. One instance is
/// opened at startup and handed to [`Library`](crate::Library) and
/// [`SettingsStore`](crate::SettingsStore).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database file at `db_path`, creating it if needed, and
    /// brings its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] when the file cannot be opened and
    /// [`DbError::Migration`] when a schema migration fails.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        Self::open(options, POOL_SIZE).await
    }

    /// Opens a private in-memory database.
    ///
    /// Used by tests that want the real schema without touching disk. The
    /// pool is capped at one connection, since each new in-memory
    /// connection would otherwise see an empty database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] when the connection fails and
    /// [`DbError::Migration`] when a schema migration fails.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new().in_memory(true);

        Self::open(options, 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying connection pool, for running queries directly.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reports the journal mode the database is actually running in.
    ///
    /// Mostly a diagnostic: file-backed databases are expected to answer
    /// `"wal"`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the pragma query fails.
    #[instrument(skip(self))]
    pub async fn journal_mode(&self) -> Result<String, DbError> {
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;

        Ok(mode.to_lowercase())
    }

    /// Closes every pooled connection.
    ///
    /// Called once on shutdown; the handle is consumed so nothing can
    /// touch the pool afterwards.
    #[instrument(skip(self))]
    pub async fn close(self) {
        self.pool.close().await;
    }
}
