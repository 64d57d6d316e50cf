//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] moves rows of one entity between the local
//! store and the remote table service, matching them by natural key.
//!
//! ## Sync Flow
//!
//! 1. **Pull** (remote → local): fetch, drop the remote surrogate key,
//!    upsert the batch locally in one transaction
//! 2. **Push** (local → remote): read local rows, drop local bookkeeping,
//!    upsert each row remotely
//!
//! There is no change tracking: every push re-sends the whole (filtered)
//! table. Conflicts resolve last-writer-wins, and since pull runs before
//! push, the local copy wins for rows edited on both sides in one cycle.
//! Deletions are never propagated.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use bulletin_core::domain::{EntityKind, Institution, Record};
use bulletin_core::ports::{ILocalStore, IRemoteTable, RowFilter};

use crate::{Direction, ReconciliationError};

// ============================================================================
// Reports
// ============================================================================

/// Outcome of pulling one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    /// Rows returned by the remote service
    pub fetched: usize,
    /// Rows new to the local store
    pub inserted: usize,
    /// Rows that replaced an existing local row
    pub updated: usize,
    /// Rows ignored because a natural-key column was missing or null
    pub skipped: usize,
}

/// Outcome of pushing one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Rows the remote service accepted
    pub sent: usize,
}

/// Outcome of a full pull-then-push of one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableSyncReport {
    pub pull: PullReport,
    pub push: PushReport,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

/// Pull/push orchestration over the two storage ports
pub struct ReconciliationEngine {
    store: Arc<dyn ILocalStore>,
    remote: Arc<dyn IRemoteTable>,
}

impl ReconciliationEngine {
    /// Creates a new engine over the given adapters
    pub fn new(store: Arc<dyn ILocalStore>, remote: Arc<dyn IRemoteTable>) -> Self {
        Self { store, remote }
    }

    /// The local store the engine writes to
    pub fn store(&self) -> &Arc<dyn ILocalStore> {
        &self.store
    }

    /// Filter selecting one institution's rows of `entity`
    ///
    /// `None` for global entities and when no scope is given.
    pub fn scope_filter(entity: EntityKind, scope: Option<&Institution>) -> Option<RowFilter> {
        let column = entity.spec().scope_column()?;
        scope.map(|institution| RowFilter::new(column, institution.as_str()))
    }

    /// Copies remote rows of `entity` into the local store
    ///
    /// Idempotent: pulling the same remote state twice leaves the local
    /// store unchanged after the first pull.
    ///
    /// # Errors
    ///
    /// A fetch failure or a failed local batch aborts the pull; the batch
    /// is transactional, so nothing from this pull is kept.
    #[tracing::instrument(skip(self, filter), fields(table = entity.table()))]
    pub async fn pull_table(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<PullReport, ReconciliationError> {
        let spec = entity.spec();
        let rows = self
            .remote
            .fetch(entity, filter)
            .await
            .map_err(|source| ReconciliationError::Remote {
                table: spec.table,
                direction: Direction::Pull,
                source,
            })?;

        let mut report = PullReport {
            fetched: rows.len(),
            ..PullReport::default()
        };

        if rows.is_empty() {
            debug!("No remote rows");
            return Ok(report);
        }

        let mut batch: Vec<Record> = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.strip_local_columns();
            match row.natural_key(spec) {
                Ok(_) => batch.push(row),
                Err(err) => {
                    warn!(error = %err, "Skipping remote row without natural key");
                    report.skipped += 1;
                }
            }
        }

        let outcomes = self
            .store
            .upsert_batch(entity, &batch)
            .await
            .map_err(|source| ReconciliationError::Storage {
                table: spec.table,
                direction: Direction::Pull,
                source,
            })?;

        for outcome in outcomes {
            if outcome.is_insert() {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            "Pulled table"
        );
        Ok(report)
    }

    /// Sends every local row of `entity` (optionally filtered) to the remote
    ///
    /// # Errors
    ///
    /// The first failed upsert aborts the push; rows sent before it stay
    /// sent.
    #[tracing::instrument(skip(self, filter), fields(table = entity.table()))]
    pub async fn push_table(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<PushReport, ReconciliationError> {
        let spec = entity.spec();
        let rows = self
            .store
            .query(entity, filter)
            .await
            .map_err(|source| ReconciliationError::Storage {
                table: spec.table,
                direction: Direction::Push,
                source,
            })?;

        let mut report = PushReport::default();
        for row in rows {
            let row = row.into_remote_shape();
            self.remote
                .upsert(entity, &row)
                .await
                .map_err(|source| ReconciliationError::Remote {
                    table: spec.table,
                    direction: Direction::Push,
                    source,
                })?;
            report.sent += 1;
        }

        info!(sent = report.sent, "Pushed table");
        Ok(report)
    }

    /// Pull then push one table, scoped to `scope` when the entity is
    /// institution-bound
    pub async fn sync_table(
        &self,
        entity: EntityKind,
        scope: Option<&Institution>,
    ) -> Result<TableSyncReport, ReconciliationError> {
        let start = Instant::now();
        let filter = Self::scope_filter(entity, scope);

        let pull = self.pull_table(entity, filter.as_ref()).await?;
        let push = self.push_table(entity, filter.as_ref()).await?;

        Ok(TableSyncReport {
            pull,
            push,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_filter_only_for_institution_entities() {
        let lycee = Institution::new("Lycee1").unwrap();

        let filter = ReconciliationEngine::scope_filter(EntityKind::Student, Some(&lycee)).unwrap();
        assert_eq!(filter, RowFilter::new("etablissement", "Lycee1"));

        assert!(ReconciliationEngine::scope_filter(EntityKind::Teacher, Some(&lycee)).is_none());
        assert!(ReconciliationEngine::scope_filter(EntityKind::Account, Some(&lycee)).is_none());
        assert!(ReconciliationEngine::scope_filter(EntityKind::Grade, None).is_none());
    }
}
