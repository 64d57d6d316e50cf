//! Per-table sync bookkeeping
//!
//! One [`SyncMetadata`] row exists per table once the scheduler has
//! finished a reconciliation of it. The status flag is the reliable
//! observable of sync health; log output is not.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Outcome of the latest reconciliation of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Never reconciled (schema default)
    #[default]
    Pending,
    /// Pull and push both completed
    Ok,
    /// Pull or push failed
    Failed,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Ok => "ok",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "ok" => Ok(SyncStatus::Ok),
            "failed" => Ok(SyncStatus::Failed),
            other => Err(DomainError::ValidationFailed(format!(
                "unknown sync status '{other}'"
            ))),
        }
    }
}

/// Stored bookkeeping for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub table_name: String,
    /// Time of the last successful reconciliation
    pub last_sync: Option<DateTime<Utc>>,
    pub status: SyncStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in [SyncStatus::Pending, SyncStatus::Ok, SyncStatus::Failed] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("done".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn default_status_is_pending() {
        assert_eq!(SyncStatus::default(), SyncStatus::Pending);
    }
}
