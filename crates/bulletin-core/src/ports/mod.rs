//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalStore`] - Embedded relational store holding the offline copy
//! - [`IRemoteTable`] - Hosted table service holding the shared copy
//! - [`ISyncMetadataRepository`] - Per-table last-sync bookkeeping

pub mod local_store;
pub mod remote_table;
pub mod sync_metadata;

pub use local_store::{ILocalStore, RowFilter, UpsertOutcome};
pub use remote_table::IRemoteTable;
pub use sync_metadata::ISyncMetadataRepository;
