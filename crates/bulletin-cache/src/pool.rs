//! SQLite pool for the local copy of the school records
//!
//! Opening a pool also brings the schema up to date: every statement in
//! `migrations/0001_initial.sql` is `IF NOT EXISTS`, so it runs on each
//! open.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use bulletin_core::domain::StorageError;

/// Schema applied on every open
const SCHEMA_SQL: &str = include_str!("migrations/0001_initial.sql");

/// How long a statement waits on SQLite's file lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connections kept open for a file-backed database
const MAX_CONNECTIONS: u32 = 5;

/// Shared SQLite pool behind the local store and the metadata repository
///
/// File databases run in WAL mode with up to [`MAX_CONNECTIONS`]
/// connections; contention between the application and the sync worker
/// is left to SQLite's busy timeout. In-memory databases live in a single
/// connection, since each connection would otherwise see its own empty
/// database.
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database file at `db_path`
    ///
    /// Missing parent directories and tables are created.
    ///
    /// # Errors
    ///
    /// `ConnectionFailed` when the directory or file cannot be opened,
    /// `MigrationFailed` when the schema cannot be applied.
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::ConnectionFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let label = db_path.display().to_string();
        let pool = Self::open(
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS),
            options,
            &label,
        )
        .await?;

        tracing::info!(path = %db_path.display(), "Local database opened");
        Ok(pool)
    }

    /// Opens a private in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::ConnectionFailed(format!("in-memory database: {}", e))
        })?;
        let pool = Self::open(
            SqlitePoolOptions::new().max_connections(1),
            options,
            "in-memory database",
        )
        .await?;

        tracing::debug!("In-memory database opened");
        Ok(pool)
    }

    /// Connects and applies the schema; `label` names the database in errors
    async fn open(
        pool_options: SqlitePoolOptions,
        options: SqliteConnectOptions,
        label: &str,
    ) -> Result<Self, StorageError> {
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("{}: {}", label, e)))?;
        apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection; later calls on clones of the pool fail
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Creates every table that does not exist yet
///
/// Idempotent; run on every pool open and by `ILocalStore::ensure_schema`.
pub(crate) async fn apply_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;

    tracing::debug!("Schema applied");
    Ok(())
}
