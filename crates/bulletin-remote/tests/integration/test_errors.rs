//! Tests for HTTP status and transport failure mapping

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use bulletin_core::domain::{EntityKind, Record, RemoteError};
use bulletin_core::ports::IRemoteTable;
use bulletin_remote::{RestClient, RestTableProvider};

use crate::common::{provider_for, setup_rest_mock, table_path};

async fn fetch_error(status: u16) -> RemoteError {
    let (server, provider) = setup_rest_mock().await;
    Mock::given(method("GET"))
        .and(path(table_path("Class")))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .mount(&server)
        .await;

    provider
        .fetch(EntityKind::Class, None)
        .await
        .expect_err("status should map to an error")
}

#[tokio::test]
async fn test_status_codes_map_to_remote_errors() {
    assert!(matches!(fetch_error(401).await, RemoteError::Unauthorized(_)));
    assert!(matches!(fetch_error(403).await, RemoteError::Forbidden(_)));
    assert!(matches!(fetch_error(404).await, RemoteError::NotFound(_)));
    assert!(matches!(fetch_error(409).await, RemoteError::Conflict(_)));
    assert!(matches!(fetch_error(503).await, RemoteError::ServerError(_)));
    assert_eq!(
        fetch_error(400).await,
        RemoteError::UnexpectedStatus {
            status: 400,
            body: "nope".to_string()
        }
    );
}

#[tokio::test]
async fn test_429_parses_retry_after() {
    let (server, provider) = setup_rest_mock().await;
    Mock::given(method("POST"))
        .and(path(table_path("Class")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(1)
        .mount(&server)
        .await;

    let record = Record::try_from(json!({"nom": "6A", "etablissement": "Lycee1"})).unwrap();
    let err = provider.upsert(EntityKind::Class, &record).await.unwrap_err();

    assert_eq!(
        err,
        RemoteError::TooManyRequests {
            retry_after: Duration::from_secs(7)
        }
    );
}

#[tokio::test]
async fn test_non_array_body_is_invalid_response() {
    let (server, provider) = setup_rest_mock().await;
    Mock::given(method("GET"))
        .and(path(table_path("Matieres")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hi"})))
        .mount(&server)
        .await;

    let err = provider.fetch(EntityKind::Subject, None).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_malformed_json_is_invalid_response() {
    let (server, provider) = setup_rest_mock().await;
    Mock::given(method("GET"))
        .and(path(table_path("Matieres")))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{\"nom\":"))
        .mount(&server)
        .await;

    let err = provider.fetch(EntityKind::Subject, None).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_array_of_scalars_is_invalid_response() {
    let (server, provider) = setup_rest_mock().await;
    Mock::given(method("GET"))
        .and(path(table_path("Teacher")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let err = provider.fetch(EntityKind::Teacher, None).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_server_hits_timeout() {
    let (server, _) = setup_rest_mock().await;
    Mock::given(method("GET"))
        .and(path(table_path("Class")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server, Duration::from_millis(200));
    let err = provider.fetch(EntityKind::Class, None).await.unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Port 9 (discard) is closed on test hosts; the connect fails fast.
    let client = RestClient::new("http://127.0.0.1:9/rest/v1", None);
    let provider = RestTableProvider::new(client);

    let err = provider.fetch(EntityKind::Class, None).await.unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
}
