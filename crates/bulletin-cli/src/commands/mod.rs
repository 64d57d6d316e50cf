//! Subcommand implementations
//!
//! Every command receives a [`CliContext`] carrying the resolved
//! configuration and the requested output format.

pub mod config;
pub mod init;
pub mod status;
pub mod sync;
pub mod table;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use bulletin_cache::{DatabasePool, SqliteLocalStore, SqliteSyncMetadataRepository};
use bulletin_core::config::Config;
use bulletin_core::domain::{DomainError, Institution};
use bulletin_remote::{RestClient, RestTableProvider};
use bulletin_sync::ReconciliationEngine;

use crate::output::OutputFormat;

/// State shared by every command
#[derive(Debug)]
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
}

impl CliContext {
    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }
}

/// clap value parser for `--institution`
pub fn parse_institution(value: &str) -> Result<Institution, DomainError> {
    Institution::new(value.trim())
}

/// Local database plus the adapters built on it
pub struct Backend {
    pub pool: DatabasePool,
    pub engine: ReconciliationEngine,
    pub metadata: SqliteSyncMetadataRepository,
}

impl Backend {
    /// Opens (creating if needed) the local database and connects the
    /// remote client
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = open_pool(config).await?;

        let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));
        let metadata = SqliteSyncMetadataRepository::new(pool.pool().clone());

        let client =
            RestClient::from_config(&config.remote).context("Failed to build remote client")?;
        let remote = Arc::new(RestTableProvider::new(client));

        Ok(Self {
            engine: ReconciliationEngine::new(store, remote),
            metadata,
            pool,
        })
    }
}

pub async fn open_pool(config: &Config) -> Result<DatabasePool> {
    let db_path = &config.storage.database_path;
    DatabasePool::new(db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}
