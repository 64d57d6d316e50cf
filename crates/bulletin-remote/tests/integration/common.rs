//! Shared test helpers for REST table API integration tests
//!
//! The mock server is mounted under `/rest/v1` so paths match a hosted
//! deployment.

use std::time::Duration;

use wiremock::MockServer;

use bulletin_remote::{RestClient, RestTableProvider};

/// API key used by every test client
pub const TEST_KEY: &str = "test-service-key";

/// REST prefix the provider is pointed at
pub const REST_PREFIX: &str = "/rest/v1";

/// Starts a mock server and returns a provider pointing at it
pub async fn setup_rest_mock() -> (MockServer, RestTableProvider) {
    let server = MockServer::start().await;
    let provider = provider_for(&server, Duration::from_secs(5));
    (server, provider)
}

/// Builds a provider for an existing server with the given timeout
pub fn provider_for(server: &MockServer, timeout: Duration) -> RestTableProvider {
    let client = RestClient::with_timeout(
        format!("{}{}", server.uri(), REST_PREFIX),
        Some(TEST_KEY.to_string()),
        timeout,
    )
    .expect("client should build");
    RestTableProvider::new(client)
}

/// Full mock path for a table
pub fn table_path(table: &str) -> String {
    format!("{REST_PREFIX}/{table}")
}
