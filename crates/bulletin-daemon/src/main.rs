//! BulletinPro Daemon - Background synchronization service
//!
//! This binary runs next to the desktop application and handles:
//! - The bootstrap sync for the logged-in user
//! - Periodic reconciliation of every table with the remote service
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! All adapters are constructed once here and injected into the engine,
//! the scheduler, and the bootstrap. The process then waits on a
//! `CancellationToken` that is triggered on receipt of SIGTERM or SIGINT,
//! and stops the scheduler within its configured timeout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bulletin_cache::{DatabasePool, SqliteLocalStore, SqliteSyncMetadataRepository};
use bulletin_core::config::Config;
use bulletin_core::domain::{Login, LoginSession, Role};
use bulletin_remote::{RestClient, RestTableProvider};
use bulletin_sync::{BootstrapOutcome, BootstrapSync, ReconciliationEngine, SyncScheduler};

/// Command-line arguments of `bulletind`
#[derive(Debug, Parser)]
#[command(name = "bulletind")]
#[command(about = "BulletinPro background sync daemon", version)]
struct Args {
    /// Login accepted by the authentication flow
    #[arg(long, env = "BULLETIN_LOGIN")]
    login: String,

    /// Role of that login (`User.titre`)
    #[arg(long, env = "BULLETIN_ROLE")]
    role: String,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Owns every long-lived component of the daemon
struct DaemonService {
    pool: DatabasePool,
    bootstrap: BootstrapSync,
    scheduler: Arc<SyncScheduler>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the database and wires the adapters together
    async fn new(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        let db_path = &config.storage.database_path;
        let pool = DatabasePool::new(db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));
        let metadata = Arc::new(SqliteSyncMetadataRepository::new(pool.pool().clone()));

        let client =
            RestClient::from_config(&config.remote).context("Failed to build remote client")?;
        let remote = Arc::new(RestTableProvider::new(client));

        let engine = Arc::new(ReconciliationEngine::new(store, remote));
        let scheduler = Arc::new(SyncScheduler::from_config(
            engine.clone(),
            metadata,
            &config.sync,
        ));
        let bootstrap = BootstrapSync::new(engine, scheduler.clone());

        Ok(Self {
            pool,
            bootstrap,
            scheduler,
            shutdown,
        })
    }

    /// Runs the bootstrap, then keeps the scheduler alive until shutdown
    async fn run(&self, session: &LoginSession) -> Result<()> {
        let outcome = self
            .bootstrap
            .run(session)
            .await
            .context("Bootstrap sync failed")?;

        match outcome {
            BootstrapOutcome::Skipped => {
                info!(role = %session.role, "Role has no institution data; nothing to schedule");
                return Ok(());
            }
            BootstrapOutcome::NoInstitution => {
                warn!(login = %session.login, "No institution for this login; nothing to schedule");
                return Ok(());
            }
            BootstrapOutcome::Started { institution } => {
                info!(%institution, "Periodic sync running");
            }
        }

        self.shutdown.cancelled().await;
        info!("Shutdown requested, stopping scheduler");

        if !self.scheduler.stop().await {
            warn!("Scheduler did not stop in time; exiting anyway");
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
///
/// A handler that cannot be installed is logged and never fires; the other
/// one still works.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

fn parse_session(args: &Args) -> Result<LoginSession> {
    let login = Login::new(args.login.as_str()).context("Invalid --login")?;
    let role: Role = args.role.parse().context("Invalid --role")?;
    Ok(LoginSession::new(login, role))
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_with_env(&config_path);

    init_tracing(&config.logging.level);
    info!(config_path = %config_path.display(), "BulletinPro daemon starting (bulletind)");

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            error!(%problem, "Invalid configuration");
        }
        anyhow::bail!("Configuration has {} error(s)", problems.len());
    }

    let session = parse_session(&args)?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(&config, shutdown_token).await?;
    let result = service.run(&session).await;
    service.close().await;

    match &result {
        Ok(()) => info!("BulletinPro daemon shut down gracefully"),
        Err(e) => error!(error = %e, "BulletinPro daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
