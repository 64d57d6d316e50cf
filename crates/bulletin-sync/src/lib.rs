//! BulletinPro Sync - Reconciliation of the local and remote copies
//!
//! Provides:
//! - Per-table pull (remote → local) and push (local → remote) by natural key
//! - A background scheduler repeating full passes on a fixed interval
//! - The post-login bootstrap that seeds the local store
//!
//! ## Modules
//!
//! - [`engine`] - Pull, push, and per-table sync
//! - [`scheduler`] - Cancellable periodic sync loop
//! - [`bootstrap`] - Role-aware first sync after login

pub mod bootstrap;
pub mod engine;
pub mod scheduler;

use std::fmt;

use thiserror::Error;

use bulletin_core::domain::{RemoteError, StorageError};

pub use bootstrap::{BootstrapOutcome, BootstrapSync};
pub use engine::{PullReport, PushReport, ReconciliationEngine, TableSyncReport};
pub use scheduler::{run_pass, SyncScheduler, TableOutcome};

/// Which half of a table's reconciliation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Remote → local
    Pull,
    /// Local → remote
    Push,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Pull => f.write_str("pull"),
            Direction::Push => f.write_str("push"),
        }
    }
}

/// Errors raised while reconciling one table
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// The local store failed
    #[error("{direction} of {table} failed in local store: {source}")]
    Storage {
        table: &'static str,
        direction: Direction,
        #[source]
        source: StorageError,
    },

    /// The remote service failed
    #[error("{direction} of {table} failed on remote: {source}")]
    Remote {
        table: &'static str,
        direction: Direction,
        #[source]
        source: RemoteError,
    },
}

impl ReconciliationError {
    pub fn table(&self) -> &'static str {
        match self {
            ReconciliationError::Storage { table, .. } | ReconciliationError::Remote { table, .. } => {
                table
            }
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            ReconciliationError::Storage { direction, .. }
            | ReconciliationError::Remote { direction, .. } => *direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_table_and_direction() {
        let err = ReconciliationError::Remote {
            table: "Students",
            direction: Direction::Push,
            source: RemoteError::Forbidden("rls".into()),
        };
        assert_eq!(
            err.to_string(),
            "push of Students failed on remote: Forbidden: rls"
        );
        assert_eq!(err.table(), "Students");
        assert_eq!(err.direction(), Direction::Push);
    }
}
