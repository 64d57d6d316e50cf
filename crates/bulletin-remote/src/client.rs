//! REST table API client
//!
//! Provides a typed HTTP client for a PostgREST-style table service (the
//! REST layer of a hosted Postgres such as Supabase). Handles the API key
//! headers, endpoint construction, and the mapping of HTTP failures onto
//! [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bulletin_remote::client::RestClient;
//!
//! # fn example() -> Result<(), bulletin_core::domain::RemoteError> {
//! let client = RestClient::with_timeout(
//!     "https://xyz.supabase.co/rest/v1",
//!     Some("service-key".to_string()),
//!     Duration::from_secs(30),
//! )?;
//! let request = client.request(reqwest::Method::GET, "/Students");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use bulletin_core::config::RemoteConfig;
use bulletin_core::domain::RemoteError;

/// Retry-After used when a 429 carries no usable header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Longest error body kept in `RemoteError::UnexpectedStatus`
const MAX_ERROR_BODY_CHARS: usize = 512;

// ============================================================================
// RestClient
// ============================================================================

/// HTTP client for the hosted table service
///
/// Wraps `reqwest::Client` with the service key headers and base URL
/// construction. It never retries; callers see every failure.
#[derive(Clone)]
pub struct RestClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL without trailing slash, e.g. `https://xyz.supabase.co/rest/v1`
    base_url: String,
    /// Service key sent as `apikey` and as bearer token
    api_key: Option<String>,
}

impl RestClient {
    /// Creates a client without a request timeout
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url.into()),
            api_key,
        }
    }

    /// Creates a client whose requests fail after `timeout`
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Network` if the TLS backend cannot be initialized.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url.into()),
            api_key,
        })
    }

    /// Creates a client from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        if config.api_key.is_none() {
            warn!(url = %config.url, "No remote API key configured; requests are anonymous");
        }
        Self::with_timeout(
            config.url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// `path` is relative to the base URL and starts with `/`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }

    /// Sends a request and turns non-success statuses into errors
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.send().await.map_err(map_transport_error)?;
        check_status(response).await
    }

    /// Reads a response body as a JSON array of objects
    pub async fn json_rows(response: Response) -> Result<Vec<Value>, RemoteError> {
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::InvalidResponse(format!("Malformed JSON: {e}")))?;

        match body {
            Value::Array(rows) => {
                if let Some(bad) = rows.iter().find(|row| !row.is_object()) {
                    return Err(RemoteError::InvalidResponse(format!(
                        "Expected an array of objects, found element {bad}"
                    )));
                }
                Ok(rows)
            }
            other => Err(RemoteError::InvalidResponse(format!(
                "Expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Maps a transport failure (connect, DNS, TLS, timeout, body read)
pub(crate) fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Network(format!("Request timed out: {e}"))
    } else {
        RemoteError::Network(e.to_string())
    }
}

/// Passes 2xx responses through and maps every other status
pub(crate) async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
        .unwrap_or(DEFAULT_RETRY_AFTER);

    let body = response.text().await.unwrap_or_default();
    let body = truncate(&body);
    debug!(status = status.as_u16(), body = %body, "Remote returned error status");

    Err(match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(body),
        StatusCode::FORBIDDEN => RemoteError::Forbidden(body),
        StatusCode::NOT_FOUND => RemoteError::NotFound(body),
        StatusCode::CONFLICT => RemoteError::Conflict(body),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::TooManyRequests { retry_after },
        s if s.is_server_error() => RemoteError::ServerError(format!("{}: {}", s.as_u16(), body)),
        s => RemoteError::UnexpectedStatus {
            status: s.as_u16(),
            body,
        },
    })
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT") - parsed as seconds from now
///
/// Falls back to the default duration if parsing fails.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            let diff = target - now;
            if let Some(secs) = diff
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= 3600)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_both_key_headers() {
        let client = RestClient::new("http://localhost:54321/rest/v1", Some("k3y".into()));
        let request = client.request(Method::GET, "/Students").build().unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:54321/rest/v1/Students"
        );
        assert_eq!(request.headers().get("apikey").unwrap(), "k3y");
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer k3y"
        );
    }

    #[test]
    fn test_request_without_key_is_anonymous() {
        let client = RestClient::new("http://localhost/rest/v1/", None);
        let request = client.request(Method::GET, "/User").build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost/rest/v1/User");
        assert!(request.headers().get("apikey").is_none());
        assert!(request.headers().get("authorization").is_none());
        assert!(!client.has_api_key());
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(
            parse_retry_after("12", DEFAULT_RETRY_AFTER),
            Duration::from_secs(12)
        );
        assert_eq!(
            parse_retry_after(" 3 ", DEFAULT_RETRY_AFTER),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_parse_retry_after_garbage_falls_back() {
        assert_eq!(
            parse_retry_after("soon", DEFAULT_RETRY_AFTER),
            DEFAULT_RETRY_AFTER
        );
    }

    #[test]
    fn test_parse_retry_after_past_date_falls_back() {
        assert_eq!(
            parse_retry_after("Mon, 01 Jan 2001 00:00:00 GMT", DEFAULT_RETRY_AFTER),
            DEFAULT_RETRY_AFTER
        );
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let out = truncate(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), MAX_ERROR_BODY_CHARS + 3);
        assert_eq!(truncate("short"), "short");
    }
}
