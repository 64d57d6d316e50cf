//! Domain entities and business logic
//!
//! This module contains the core domain types for BulletinPro sync:
//! - The Entity Key Registry describing every synchronized table
//! - Records (rows as column/value maps) and their natural keys
//! - Newtypes for validated identifiers
//! - The login session handed over by the authentication flow
//! - Per-table sync metadata
//! - Domain-specific error types

pub mod entity;
pub mod errors;
pub mod newtypes;
pub mod record;
pub mod session;
pub mod sync_metadata;

// Re-export commonly used types
pub use entity::{EntityKind, EntitySpec, KeyScope, ENTITY_REGISTRY};
pub use errors::{DomainError, RemoteError, StorageError};
pub use newtypes::{Institution, Login};
pub use record::{NaturalKey, Record};
pub use session::{LoginSession, Role};
pub use sync_metadata::{SyncMetadata, SyncStatus};
