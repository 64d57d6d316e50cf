//! Sync scheduler - periodic full passes over every registered table
//!
//! The [`SyncScheduler`] owns at most one background tokio task. Each pass
//! visits the tables in registry order, runs pull-then-push for each, and
//! records the outcome in the sync metadata. Between passes it sleeps for
//! the configured interval.
//!
//! ## States
//!
//! ```text
//!          start()            stop()                task ends
//!  Idle ─────────────→ Running ───────→ Stopping ─────────────→ Idle
//! ```
//!
//! A worker stays in its slot until its task has actually ended, so a
//! `start()` issued while a previous worker is still stopping (or was
//! left behind by a timed-out `stop()`) is refused. Cancellation is
//! cooperative: the token is checked before each table and interrupts the
//! inter-pass sleep, but an in-flight table runs to completion (or until
//! its request timeout fires).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bulletin_core::config::SyncConfig;
use bulletin_core::domain::{EntityKind, Institution, SyncStatus, ENTITY_REGISTRY};
use bulletin_core::ports::ISyncMetadataRepository;

use crate::engine::{ReconciliationEngine, TableSyncReport};
use crate::ReconciliationError;

/// The background task, the token that stops it, and its exit signal
struct Worker {
    generation: u64,
    cancel: CancellationToken,
    /// Flips to `true` when the loop returns; closed if the task panics
    done: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

/// Runs [`ReconciliationEngine::sync_table`] for every entity on a timer
///
/// `start` and `stop` may be called from any thread, including threads
/// outside the runtime: the worker is spawned on the runtime handle
/// captured at construction. The worker slot is guarded by a mutex that
/// is never held across an await point.
pub struct SyncScheduler {
    engine: Arc<ReconciliationEngine>,
    metadata: Arc<dyn ISyncMetadataRepository>,
    interval: Duration,
    stop_timeout: Duration,
    runtime: Option<Handle>,
    worker: Mutex<Option<Worker>>,
    generations: AtomicU64,
    cycles: Arc<AtomicU64>,
}

impl SyncScheduler {
    /// Creates an idle scheduler
    ///
    /// When called inside a tokio runtime, that runtime is the one the
    /// worker will run on; otherwise use [`SyncScheduler::with_runtime`].
    ///
    /// # Arguments
    /// * `interval` - Sleep between two full passes
    /// * `stop_timeout` - How long `stop()` waits for the task to finish
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        metadata: Arc<dyn ISyncMetadataRepository>,
        interval: Duration,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            metadata,
            interval,
            stop_timeout,
            runtime: Handle::try_current().ok(),
            worker: Mutex::new(None),
            generations: AtomicU64::new(0),
            cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an idle scheduler using the `sync` configuration section
    pub fn from_config(
        engine: Arc<ReconciliationEngine>,
        metadata: Arc<dyn ISyncMetadataRepository>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(
            engine,
            metadata,
            Duration::from_secs(config.interval_secs),
            Duration::from_secs(config.stop_timeout_secs),
        )
    }

    /// Spawns the worker on `runtime` instead of the construction-time one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the background loop for `scope`
    ///
    /// Returns `false` without side effects when a worker is still alive,
    /// whether running or stopping, or when no runtime is available.
    pub fn start(&self, scope: Option<Institution>) -> bool {
        let mut slot = self.worker_slot();

        if let Some(worker) = slot.as_ref() {
            if !worker.handle.is_finished() {
                if worker.cancel.is_cancelled() {
                    warn!("Previous sync worker is still stopping; start ignored");
                } else {
                    warn!("Sync scheduler already running; start ignored");
                }
                return false;
            }
        }

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            error!("No tokio runtime available; sync scheduler not started");
            return false;
        };

        let cancel = CancellationToken::new();
        let (done_tx, done) = watch::channel(false);
        let run = run_loop(
            self.engine.clone(),
            self.metadata.clone(),
            scope.clone(),
            self.interval,
            cancel.clone(),
            self.cycles.clone(),
        );
        let handle = runtime.spawn(async move {
            run.await;
            let _ = done_tx.send(true);
        });

        info!(
            scope = scope.as_ref().map(Institution::as_str),
            interval_secs = self.interval.as_secs(),
            "Sync scheduler started"
        );

        *slot = Some(Worker {
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
            cancel,
            done,
            handle,
        });
        true
    }

    /// Requests the loop to stop and waits up to the stop timeout
    ///
    /// Returns `true` when the task has terminated (or none was running) and
    /// `false` when the timeout elapsed first. In the latter case the task
    /// is left to exit at its next table boundary and keeps its slot, so
    /// `start()` stays refused until it has.
    pub async fn stop(&self) -> bool {
        let (generation, mut done) = {
            let slot = self.worker_slot();
            let Some(worker) = slot.as_ref() else {
                debug!("Sync scheduler not running; stop is a no-op");
                return true;
            };
            worker.cancel.cancel();
            (worker.generation, worker.done.clone())
        };

        let loop_returned = async { done.wait_for(|ended| *ended).await.is_ok() };

        match tokio::time::timeout(self.stop_timeout, loop_returned).await {
            Ok(completed) => {
                if let Some(worker) = self.release(generation) {
                    // The loop has returned; only the spawn wrapper remains
                    if let Err(join_err) = worker.handle.await {
                        error!(error = %join_err, "Sync scheduler task ended abnormally");
                    }
                }
                if !completed {
                    error!("Sync scheduler task ended without completing its loop");
                } else {
                    info!("Sync scheduler stopped");
                }
                true
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.stop_timeout.as_millis() as u64,
                    "Sync scheduler did not stop in time; task left to finish on its own"
                );
                false
            }
        }
    }

    /// Removes the worker of `generation` from the slot, if still there
    fn release(&self, generation: u64) -> Option<Worker> {
        let mut slot = self.worker_slot();
        if slot.as_ref().is_some_and(|w| w.generation == generation) {
            slot.take()
        } else {
            None
        }
    }

    /// `true` while a worker task is alive, including one that is stopping
    pub fn is_running(&self) -> bool {
        self.worker_slot()
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Number of full passes completed since construction
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }
}

/// Result of one table within a pass
#[derive(Debug)]
pub struct TableOutcome {
    pub entity: EntityKind,
    pub result: Result<TableSyncReport, ReconciliationError>,
}

/// Runs one full pass over every registered table, in registry order
///
/// Each table's outcome is recorded in the sync metadata; a failing table
/// is logged and the pass moves on. Returns `None` when `cancel` fired
/// before the pass completed.
pub async fn run_pass(
    engine: &ReconciliationEngine,
    metadata: &dyn ISyncMetadataRepository,
    scope: Option<&Institution>,
    cancel: &CancellationToken,
) -> Option<Vec<TableOutcome>> {
    let mut outcomes = Vec::with_capacity(ENTITY_REGISTRY.len());

    for entity in EntityKind::all() {
        if cancel.is_cancelled() {
            debug!(table = entity.table(), "Cancelled at table boundary");
            return None;
        }

        let result = engine.sync_table(entity, scope).await;
        let status = match &result {
            Ok(report) => {
                debug!(
                    table = entity.table(),
                    duration_ms = report.duration_ms,
                    "Table synchronized"
                );
                SyncStatus::Ok
            }
            Err(err) => {
                error!(
                    table = err.table(),
                    direction = %err.direction(),
                    error = %err,
                    "Table sync failed"
                );
                SyncStatus::Failed
            }
        };

        if let Err(err) = metadata.record(entity.table(), status, Utc::now()).await {
            warn!(table = entity.table(), error = %err, "Failed to record sync metadata");
        }
        outcomes.push(TableOutcome { entity, result });
    }

    Some(outcomes)
}

/// Body of the background task
async fn run_loop(
    engine: Arc<ReconciliationEngine>,
    metadata: Arc<dyn ISyncMetadataRepository>,
    scope: Option<Institution>,
    interval: Duration,
    cancel: CancellationToken,
    cycles: Arc<AtomicU64>,
) {
    loop {
        if run_pass(&engine, metadata.as_ref(), scope.as_ref(), &cancel)
            .await
            .is_none()
        {
            return;
        }

        let completed = cycles.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(cycle = completed, "Sync pass completed");

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
