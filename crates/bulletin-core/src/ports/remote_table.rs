//! Remote table port (driven/secondary port)
//!
//! Typed access to the hosted table service. Implementations return only
//! rows visible under their credentials and never retry.

use crate::domain::{EntityKind, Record, RemoteError};
use crate::ports::local_store::RowFilter;

/// Port trait for the hosted table service
#[async_trait::async_trait]
pub trait IRemoteTable: Send + Sync {
    /// Reads all visible rows of an entity, optionally filtered
    async fn fetch(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Record>, RemoteError>;

    /// Inserts or updates one row
    ///
    /// `record` must already be in remote shape (no surrogate key, no local
    /// bookkeeping columns). The service decides insert vs update using its
    /// own natural-key uniqueness constraint.
    async fn upsert(&self, entity: EntityKind, record: &Record) -> Result<(), RemoteError>;
}
