//! Domain error types
//!
//! This module defines the error taxonomy shared by every crate:
//! - [`DomainError`] for validation failures inside the core
//! - [`StorageError`] for failures of the local store adapter
//! - [`RemoteError`] for failures of the hosted table service adapter
//!
//! Storage and remote errors live here (rather than in their adapter
//! crates) because the port traits in [`crate::ports`] return them.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No entity is registered under this table or entity name
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Role string could not be interpreted
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised by the local store
///
/// A `StorageError` invalidates only the call that produced it; the store
/// remains usable for subsequent calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema creation failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be converted to or from a record value
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A record lacks one of the natural-key columns of its table
    #[error("Record for {table} is missing natural key column '{column}'")]
    MissingNaturalKey {
        /// Table the record was destined for
        table: &'static str,
        /// The absent key column
        column: &'static str,
    },
}

/// Errors raised by the remote table client
///
/// The client never retries; retry policy belongs to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials are valid but lack permission for the table
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The table or endpoint does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service rejected the write due to a constraint conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded; the service asked to wait before retrying
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration the service asked to wait
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// A transport-level failure (DNS, connect, TLS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be parsed or had the wrong shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns true when the failure is likely to clear on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Network(_)
                | RemoteError::ServerError(_)
                | RemoteError::TooManyRequests { .. }
        )
    }
}
