//! Sync command - One full pass over every table
//!
//! Runs the same pass as the background scheduler once: each table in
//! registry order is pulled then pushed, and its outcome is recorded in
//! the sync metadata. A failing table does not stop the pass, but makes
//! the command exit with an error once every table has been visited.

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use bulletin_core::domain::Institution;
use bulletin_sync::{run_pass, TableOutcome};

use super::{parse_institution, Backend, CliContext};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Restrict institution-bound tables to this institution
    #[arg(long, value_parser = parse_institution)]
    pub institution: Option<Institution>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let backend = Backend::open(&ctx.config).await?;

        info!(
            institution = self.institution.as_ref().map(Institution::as_str),
            "Running sync pass"
        );

        let outcomes = run_pass(
            &backend.engine,
            &backend.metadata,
            self.institution.as_ref(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_or_default();
        backend.pool.close().await;

        let failures = outcomes.iter().filter(|o| o.result.is_err()).count();

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "institution": self.institution.as_ref().map(Institution::as_str),
                "tables": outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
                "failed": failures,
            }));
        } else {
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(report) => formatter.success(&format!(
                        "{}: pulled {} ({} new, {} updated, {} skipped), pushed {} in {} ms",
                        outcome.entity.table(),
                        report.pull.fetched,
                        report.pull.inserted,
                        report.pull.updated,
                        report.pull.skipped,
                        report.push.sent,
                        report.duration_ms
                    )),
                    Err(err) => formatter.error(&format!("{}: {}", outcome.entity.table(), err)),
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} tables failed to sync", failures, outcomes.len());
        }
        Ok(())
    }
}

fn outcome_json(outcome: &TableOutcome) -> serde_json::Value {
    match &outcome.result {
        Ok(report) => serde_json::json!({
            "table": outcome.entity.table(),
            "status": "ok",
            "report": report,
        }),
        Err(err) => serde_json::json!({
            "table": outcome.entity.table(),
            "status": "failed",
            "direction": err.direction().to_string(),
            "error": err.to_string(),
        }),
    }
}
