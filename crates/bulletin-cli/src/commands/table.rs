//! Pull and push commands - Reconcile one table in one direction
//!
//! `bulletin pull <table>` copies remote rows into the local database;
//! `bulletin push <table>` sends every local row to the remote service.
//! With `--institution`, institution-bound tables are restricted to that
//! institution's rows. Neither command touches the sync metadata.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bulletin_core::domain::{EntityKind, Institution};
use bulletin_sync::{PullReport, PushReport, ReconciliationEngine};

use super::{parse_institution, Backend, CliContext};

/// Table selection shared by `pull` and `push`
#[derive(Debug, Args)]
pub struct TableTarget {
    /// Table or entity name (e.g. `Students`, `Grade`, `notes`)
    pub table: EntityKind,

    /// Restrict to one institution's rows
    #[arg(long, value_parser = parse_institution)]
    pub institution: Option<Institution>,
}

impl TableTarget {
    fn scope_note(&self) -> String {
        match (&self.institution, self.table.spec().scope_column()) {
            (Some(institution), Some(_)) => format!(" for {}", institution),
            (Some(_), None) => " (global table, institution ignored)".to_string(),
            (None, _) => String::new(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PullCommand {
    #[command(flatten)]
    pub target: TableTarget,
}

impl PullCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let backend = Backend::open(&ctx.config).await?;

        let entity = self.target.table;
        let filter = ReconciliationEngine::scope_filter(entity, self.target.institution.as_ref());

        info!(table = entity.table(), "Pulling table");
        let result = backend.engine.pull_table(entity, filter.as_ref()).await;
        backend.pool.close().await;
        let report: PullReport =
            result.with_context(|| format!("Pull of {} failed", entity.table()))?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "table": entity.table(),
                "institution": self.target.institution.as_ref().map(|i| i.as_str()),
                "pull": report,
            }));
        } else {
            formatter.success(&format!(
                "Pulled {}{}",
                entity.table(),
                self.target.scope_note()
            ));
            formatter.field("Fetched", &report.fetched.to_string());
            formatter.field("Inserted", &report.inserted.to_string());
            formatter.field("Updated", &report.updated.to_string());
            formatter.field("Skipped", &report.skipped.to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct PushCommand {
    #[command(flatten)]
    pub target: TableTarget,
}

impl PushCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let backend = Backend::open(&ctx.config).await?;

        let entity = self.target.table;
        let filter = ReconciliationEngine::scope_filter(entity, self.target.institution.as_ref());

        info!(table = entity.table(), "Pushing table");
        let result = backend.engine.push_table(entity, filter.as_ref()).await;
        backend.pool.close().await;
        let report: PushReport =
            result.with_context(|| format!("Push of {} failed", entity.table()))?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "table": entity.table(),
                "institution": self.target.institution.as_ref().map(|i| i.as_str()),
                "push": report,
            }));
        } else {
            formatter.success(&format!(
                "Pushed {}{}",
                entity.table(),
                self.target.scope_note()
            ));
            formatter.field("Sent", &report.sent.to_string());
        }
        Ok(())
    }
}
