//! SQLite implementation of ISyncMetadataRepository

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use bulletin_core::domain::{StorageError, SyncMetadata, SyncStatus};
use bulletin_core::ports::ISyncMetadataRepository;

use crate::query_failed;

/// Per-table bookkeeping stored in the `sync_metadata` table
#[derive(Clone)]
pub struct SqliteSyncMetadataRepository {
    pool: SqlitePool,
}

impl SqliteSyncMetadataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Parse a DateTime<Utc> from an RFC 3339 string or SQLite's default format
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn metadata_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SyncMetadata, StorageError> {
    let table_name: String = row.try_get("table_name").map_err(query_failed)?;
    let last_sync: Option<String> = row.try_get("last_sync").map_err(query_failed)?;
    let status: Option<String> = row.try_get("sync_status").map_err(query_failed)?;

    let last_sync = match last_sync {
        Some(ref s) if !s.is_empty() => Some(parse_datetime(s)?),
        _ => None,
    };
    let status = match status {
        Some(s) => s
            .parse::<SyncStatus>()
            .map_err(|e| StorageError::SerializationError(e.to_string()))?,
        None => SyncStatus::default(),
    };

    Ok(SyncMetadata {
        table_name,
        last_sync,
        status,
    })
}

#[async_trait::async_trait]
impl ISyncMetadataRepository for SqliteSyncMetadataRepository {
    async fn record(
        &self,
        table_name: &str,
        status: SyncStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let success_at = (status == SyncStatus::Ok).then(|| at.to_rfc3339());

        sqlx::query(
            "INSERT INTO sync_metadata (table_name, last_sync, sync_status) \
             VALUES (?, ?, ?) \
             ON CONFLICT(table_name) DO UPDATE SET \
               last_sync = COALESCE(excluded.last_sync, sync_metadata.last_sync), \
               sync_status = excluded.sync_status",
        )
        .bind(table_name)
        .bind(&success_at)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        tracing::trace!(table = table_name, status = %status, "Recorded sync metadata");
        Ok(())
    }

    async fn get(&self, table_name: &str) -> Result<Option<SyncMetadata>, StorageError> {
        let row = sqlx::query("SELECT * FROM sync_metadata WHERE table_name = ?")
            .bind(table_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(metadata_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<SyncMetadata>, StorageError> {
        let rows = sqlx::query("SELECT * FROM sync_metadata ORDER BY table_name")
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        rows.iter().map(metadata_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_accepts_sqlite_and_rfc3339_formats() {
        let sqlite = parse_datetime("2026-03-01 08:30:00").unwrap();
        let rfc = parse_datetime("2026-03-01T08:30:00+00:00").unwrap();
        assert_eq!(sqlite, rfc);
        assert!(parse_datetime("yesterday").is_err());
    }
}
