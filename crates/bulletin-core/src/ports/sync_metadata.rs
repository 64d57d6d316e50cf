//! Sync metadata port (driven/secondary port)

use chrono::{DateTime, Utc};

use crate::domain::{StorageError, SyncMetadata, SyncStatus};

/// Port trait for per-table sync bookkeeping
#[async_trait::async_trait]
pub trait ISyncMetadataRepository: Send + Sync {
    /// Records the outcome of a table's reconciliation
    ///
    /// Creates the row on first use. `last_sync` is only advanced when
    /// `status` is [`SyncStatus::Ok`]; a failure keeps the previous
    /// successful timestamp.
    async fn record(
        &self,
        table_name: &str,
        status: SyncStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Bookkeeping for one table, `None` if it was never recorded
    async fn get(&self, table_name: &str) -> Result<Option<SyncMetadata>, StorageError>;

    /// Bookkeeping for every recorded table, ordered by table name
    async fn list(&self) -> Result<Vec<SyncMetadata>, StorageError>;
}
