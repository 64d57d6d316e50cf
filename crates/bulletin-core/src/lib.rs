//! BulletinPro Core - Domain logic for the school-records sync engine
//!
//! This crate contains the hexagonal architecture core with:
//! - **Entity Key Registry** - Declarative per-table natural keys and columns
//! - **Domain types** - `Record`, `NaturalKey`, `LoginSession`, `SyncMetadata`
//! - **Port definitions** - Traits for adapters: `ILocalStore`, `IRemoteTable`,
//!   `ISyncMetadataRepository`
//! - **Error taxonomy** - `StorageError`, `RemoteError`, `DomainError`
//! - **Configuration** - YAML config with environment overrides
//!
//! # Architecture
//!
//! The domain module contains pure types with no I/O. Ports define trait
//! interfaces that adapter crates (`bulletin-cache`, `bulletin-remote`)
//! implement, and the engine in `bulletin-sync` consumes.

pub mod config;
pub mod domain;
pub mod ports;
