//! Init command - Create the local database
//!
//! Opening the pool creates the file, its parent directories, and every
//! missing table. Running it again is harmless.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{open_pool, CliContext};

#[derive(Debug, Args)]
pub struct InitCommand {}

impl InitCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.format.formatter();
        let db_path = &ctx.config.storage.database_path;

        let pool = open_pool(&ctx.config).await?;
        pool.close().await;

        info!(path = %db_path.display(), "Local schema ensured");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "database": db_path.display().to_string(),
            }));
        } else {
            formatter.success("Local database ready");
            formatter.field("Path", &db_path.display().to_string());
        }
        Ok(())
    }
}
