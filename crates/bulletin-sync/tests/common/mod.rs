//! Shared fixtures for sync integration tests
//!
//! The local side is the real SQLite store on an in-memory pool. The
//! remote side is [`FakeRemote`], an in-memory table service that upserts
//! on the registry natural key the way the hosted service does.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use bulletin_cache::{DatabasePool, SqliteLocalStore, SqliteSyncMetadataRepository};
use bulletin_core::domain::{EntityKind, Record, RemoteError};
use bulletin_core::ports::{IRemoteTable, RowFilter};
use bulletin_sync::ReconciliationEngine;

/// In-memory stand-in for the hosted table service
#[derive(Default)]
pub struct FakeRemote {
    tables: Mutex<HashMap<EntityKind, Vec<Record>>>,
    failing: Mutex<HashSet<EntityKind>>,
    fetch_log: Mutex<Vec<(EntityKind, Option<RowFilter>)>>,
    hang: AtomicBool,
    upserts: AtomicUsize,
    next_id: AtomicI64,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores a row as-is, assigning a remote id
    pub fn seed(&self, entity: EntityKind, mut record: Record) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1000;
        record.insert("id", id);
        self.tables
            .lock()
            .unwrap()
            .entry(entity)
            .or_default()
            .push(record);
    }

    pub fn rows(&self, entity: EntityKind) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every call for `entity` fail with a server error
    pub fn fail_on(&self, entity: EntityKind) {
        self.failing.lock().unwrap().insert(entity);
    }

    pub fn heal(&self, entity: EntityKind) {
        self.failing.lock().unwrap().remove(&entity);
    }

    /// Makes every call block forever
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn fetch_log(&self) -> Vec<(EntityKind, Option<RowFilter>)> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    async fn gate(&self, entity: EntityKind) -> Result<(), RemoteError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&entity) {
            return Err(RemoteError::ServerError(format!("503: {} unavailable", entity.table())));
        }
        Ok(())
    }
}

fn matches_filter(record: &Record, filter: Option<&RowFilter>) -> bool {
    match filter {
        None => true,
        Some(f) => match record.get(&f.column) {
            Some(Value::String(s)) => *s == f.value,
            Some(other) => other.to_string() == f.value,
            None => false,
        },
    }
}

#[async_trait::async_trait]
impl IRemoteTable for FakeRemote {
    async fn fetch(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Record>, RemoteError> {
        self.fetch_log
            .lock()
            .unwrap()
            .push((entity, filter.cloned()));
        self.gate(entity).await?;

        Ok(self
            .rows(entity)
            .into_iter()
            .filter(|r| matches_filter(r, filter))
            .collect())
    }

    async fn upsert(&self, entity: EntityKind, record: &Record) -> Result<(), RemoteError> {
        self.gate(entity).await?;
        assert!(!record.contains("id"), "surrogate key must not be pushed");
        assert!(!record.contains("last_sync"), "local bookkeeping must not be pushed");

        let spec = entity.spec();
        let key = record
            .natural_key(spec)
            .map_err(|e| RemoteError::Conflict(e.to_string()))?;

        self.upserts.fetch_add(1, Ordering::SeqCst);
        {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(entity).or_default();
            if let Some(existing) = rows
                .iter_mut()
                .find(|r| r.natural_key(spec).ok().as_ref() == Some(&key))
            {
                for (column, value) in record.iter() {
                    existing.insert(column.clone(), value.clone());
                }
                return Ok(());
            }
        }
        self.seed(entity, record.clone());
        Ok(())
    }
}

/// Real in-memory store plus fake remote, wired into an engine
pub struct Harness {
    pub pool: DatabasePool,
    pub store: Arc<SqliteLocalStore>,
    pub metadata: Arc<SqliteSyncMetadataRepository>,
    pub remote: Arc<FakeRemote>,
    pub engine: Arc<ReconciliationEngine>,
}

pub async fn harness() -> Harness {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));
    let metadata = Arc::new(SqliteSyncMetadataRepository::new(pool.pool().clone()));
    let remote = FakeRemote::new();
    let engine = Arc::new(ReconciliationEngine::new(store.clone(), remote.clone()));

    Harness {
        pool,
        store,
        metadata,
        remote,
        engine,
    }
}

pub fn record(value: Value) -> Record {
    Record::try_from(value).expect("fixture must be a JSON object")
}
