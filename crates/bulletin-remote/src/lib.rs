//! BulletinPro Remote - REST table API client
//!
//! Provides async access to the hosted copy of the school records:
//! - Filtered reads of whole tables
//! - Single-row upserts resolved on the natural key by the service
//! - HTTP status mapping onto `RemoteError`
//!
//! ## Modules
//!
//! - [`client`] - HTTP client, key headers, status mapping
//! - [`provider`] - `IRemoteTable` implementation

pub mod client;
pub mod provider;

pub use client::RestClient;
pub use provider::RestTableProvider;
