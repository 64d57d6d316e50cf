//! BulletinPro Cache - Local SQLite store
//!
//! The offline copy of the school records lives here:
//! - One table per registered entity, each with a local surrogate `id`
//!   and a `last_sync` timestamp
//! - Natural-key uniqueness enforced by the schema
//! - Per-table sync bookkeeping in `sync_metadata`
//!
//! ## Architecture
//!
//! This crate implements the `ILocalStore` and `ISyncMetadataRepository`
//! ports from `bulletin-core`. It is a driven (secondary) adapter in the
//! hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool that creates the schema on open
//! - [`SqliteLocalStore`] - Natural-key upserts and filtered reads
//! - [`SqliteSyncMetadataRepository`] - Last-sync bookkeeping
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use bulletin_cache::{DatabasePool, SqliteLocalStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/BulletinPro/base.db")).await?;
//! let store = SqliteLocalStore::new(pool.pool().clone());
//! // Use store as ILocalStore...
//! # Ok(())
//! # }
//! ```

pub mod metadata;
pub mod pool;
pub mod store;

pub use metadata::SqliteSyncMetadataRepository;
pub use pool::DatabasePool;
pub use store::SqliteLocalStore;

use bulletin_core::domain::StorageError;

/// Maps a driver error onto the storage taxonomy
pub(crate) fn query_failed(e: sqlx::Error) -> StorageError {
    StorageError::QueryFailed(e.to_string())
}
