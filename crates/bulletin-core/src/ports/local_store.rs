//! Local store port (driven/secondary port)
//!
//! This module defines the interface to the embedded database that lets
//! the application work offline.
//!
//! ## Design Notes
//!
//! - Entities are addressed by [`EntityKind`]; the adapter resolves table
//!   and column names through the Entity Key Registry and must never
//!   interpolate caller-supplied identifiers into SQL.
//! - Errors are typed ([`StorageError`]) so the reconciliation layer can
//!   attribute them to a table and direction.
//! - A failed call leaves the store usable for later calls.

use crate::domain::{EntityKind, Record, StorageError};

/// Single-column equality filter (`column = value`)
///
/// Used both for local queries and for remote fetches, so that a scoped
/// pull and a scoped push select the same rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// What [`ILocalStore::upsert_by_natural_key`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was created with this surrogate key
    Inserted(i64),
    /// The row with this surrogate key was updated in place
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => id,
        }
    }

    pub fn is_insert(self) -> bool {
        matches!(self, UpsertOutcome::Inserted(_))
    }
}

/// Port trait for the embedded local store
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// Creates every entity table and the metadata table if absent
    ///
    /// Idempotent; safe to call on every startup.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Returns all rows of an entity, optionally filtered, ordered by
    /// surrogate key
    ///
    /// Returned records include the `id` and `last_sync` columns.
    async fn query(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Record>, StorageError>;

    /// Looks up the row sharing `record`'s natural key
    async fn find_by_natural_key(
        &self,
        entity: EntityKind,
        record: &Record,
    ) -> Result<Option<Record>, StorageError>;

    /// Updates the row matching the record's natural key, or inserts it
    /// with a fresh surrogate key
    ///
    /// Any `id` in `record` is ignored.
    async fn upsert_by_natural_key(
        &self,
        entity: EntityKind,
        record: &Record,
    ) -> Result<UpsertOutcome, StorageError>;

    /// Upserts every record inside one transaction
    ///
    /// Either all records are applied or none are.
    async fn upsert_batch(
        &self,
        entity: EntityKind,
        records: &[Record],
    ) -> Result<Vec<UpsertOutcome>, StorageError>;
}
