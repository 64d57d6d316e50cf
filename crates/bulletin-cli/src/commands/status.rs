//! Status command - Display per-table synchronization status
//!
//! Lists every registered table with the outcome of its latest
//! reconciliation and the time of its last successful one. Tables that
//! were never reconciled are reported as `pending`.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use bulletin_cache::SqliteSyncMetadataRepository;
use bulletin_core::domain::{EntityKind, SyncMetadata, SyncStatus};
use bulletin_core::ports::ISyncMetadataRepository;

use super::{open_pool, CliContext};

#[derive(Debug, Args)]
pub struct StatusCommand {}

/// One line of the status table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TableStatus {
    table: String,
    status: SyncStatus,
    last_sync: Option<String>,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let db_path = &ctx.config.storage.database_path;

        if !db_path.exists() {
            formatter.error(&format!(
                "No database found at {}. Run 'bulletin init' first.",
                db_path.display()
            ));
            return Ok(());
        }

        let pool = open_pool(&ctx.config).await?;
        let repo = SqliteSyncMetadataRepository::new(pool.pool().clone());
        let stored = repo.list().await;
        pool.close().await;
        let stored = stored.context("Failed to read sync metadata")?;

        info!(tables = stored.len(), "Showing sync status");
        let rows = table_statuses(&stored);

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "database": db_path.display().to_string(),
                "tables": rows,
            }));
            return Ok(());
        }

        formatter.success(&format!("Sync status - {}", db_path.display()));
        formatter.info("");
        formatter.info(&format!("{:<12} {:<8} {}", "TABLE", "STATUS", "LAST SYNC"));
        for row in &rows {
            formatter.info(&format!(
                "{:<12} {:<8} {}",
                row.table,
                row.status.as_str(),
                row.last_sync.as_deref().unwrap_or("never")
            ));
        }

        let failed = rows
            .iter()
            .filter(|row| row.status == SyncStatus::Failed)
            .count();
        if failed > 0 {
            formatter.warn(&format!("{} table(s) failed their last sync", failed));
        }
        Ok(())
    }
}

/// Registry tables in sync order, then any unknown table found in storage
fn table_statuses(stored: &[SyncMetadata]) -> Vec<TableStatus> {
    let to_row = |meta: &SyncMetadata| TableStatus {
        table: meta.table_name.clone(),
        status: meta.status,
        last_sync: meta
            .last_sync
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    };

    let mut rows: Vec<TableStatus> = EntityKind::all()
        .map(|entity| {
            stored
                .iter()
                .find(|meta| meta.table_name == entity.table())
                .map(to_row)
                .unwrap_or_else(|| TableStatus {
                    table: entity.table().to_string(),
                    status: SyncStatus::Pending,
                    last_sync: None,
                })
        })
        .collect();

    rows.extend(
        stored
            .iter()
            .filter(|meta| !EntityKind::all().any(|entity| entity.table() == meta.table_name))
            .map(to_row),
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use bulletin_core::config::ConfigBuilder;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_table_statuses_fill_pending_in_registry_order() {
        let stored = vec![
            SyncMetadata {
                table_name: "Students".into(),
                last_sync: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()),
                status: SyncStatus::Ok,
            },
            SyncMetadata {
                table_name: "Notes".into(),
                last_sync: None,
                status: SyncStatus::Failed,
            },
        ];

        let rows = table_statuses(&stored);
        let tables: Vec<&str> = rows.iter().map(|r| r.table.as_str()).collect();
        assert_eq!(
            tables,
            EntityKind::all().map(EntityKind::table).collect::<Vec<_>>()
        );

        let students = rows.iter().find(|r| r.table == "Students").unwrap();
        assert_eq!(students.status, SyncStatus::Ok);
        assert_eq!(students.last_sync.as_deref(), Some("2024-03-01 08:30:00 UTC"));

        let notes = rows.iter().find(|r| r.table == "Notes").unwrap();
        assert_eq!(notes.status, SyncStatus::Failed);
        assert!(notes.last_sync.is_none());

        let class = rows.iter().find(|r| r.table == "Class").unwrap();
        assert_eq!(class.status, SyncStatus::Pending);
    }

    #[test]
    fn test_table_statuses_keep_unknown_tables() {
        let stored = vec![SyncMetadata {
            table_name: "Legacy".into(),
            last_sync: None,
            status: SyncStatus::Ok,
        }];
        let rows = table_statuses(&stored);
        assert_eq!(rows.last().unwrap().table, "Legacy");
        assert_eq!(rows.len(), EntityKind::all().count() + 1);
    }

    #[tokio::test]
    async fn test_status_on_initialized_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new()
            .database_path(dir.path().join("base.db"))
            .build();
        let ctx = CliContext {
            config_path: dir.path().join("config.yaml"),
            config,
            format: OutputFormat::Json,
        };

        crate::commands::init::InitCommand {}.execute(&ctx).await.unwrap();
        assert!(ctx.config.storage.database_path.exists());
        assert!(StatusCommand {}.execute(&ctx).await.is_ok());
    }
}
