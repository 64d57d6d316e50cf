//! Tests for filtered and unfiltered table reads

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use bulletin_core::domain::EntityKind;
use bulletin_core::ports::{IRemoteTable, RowFilter};

use crate::common::{setup_rest_mock, table_path, TEST_KEY};

#[tokio::test]
async fn test_fetch_unfiltered_returns_records() {
    let (server, provider) = setup_rest_mock().await;

    Mock::given(method("GET"))
        .and(path(table_path("User")))
        .and(query_param("select", "*"))
        .and(header("apikey", TEST_KEY))
        .and(header("authorization", format!("Bearer {TEST_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "identifiant": "admin", "titre": "admin"},
            {"id": 2, "identifiant": "prof1", "titre": "directeur", "etablissement": "Lycee1"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = provider.fetch(EntityKind::Account, None).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get_str("identifiant"), Some("prof1"));
    assert_eq!(rows[1].surrogate_id(), Some(2));
}

#[tokio::test]
async fn test_fetch_filtered_uses_eq_operator() {
    let (server, provider) = setup_rest_mock().await;

    Mock::given(method("GET"))
        .and(path(table_path("Students")))
        .and(query_param("select", "*"))
        .and(query_param("etablissement", "eq.Lycee1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "matricule": "A100", "etablissement": "Lycee1", "nom": "Diallo"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = RowFilter::new("etablissement", "Lycee1");
    let rows = provider
        .fetch(EntityKind::Student, Some(&filter))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("nom"), Some("Diallo"));
}

#[tokio::test]
async fn test_fetch_empty_table() {
    let (server, provider) = setup_rest_mock().await;

    Mock::given(method("GET"))
        .and(path(table_path("Notes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let rows = provider.fetch(EntityKind::Grade, None).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_fetch_follows_pages_until_total() {
    let (server, provider) = setup_rest_mock().await;
    let provider = provider.with_page_size(2);

    Mock::given(method("GET"))
        .and(path(table_path("Students")))
        .and(query_param("order", "matricule,etablissement"))
        .and(header("range-unit", "items"))
        .and(header("range", "0-1"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "0-1/3")
                .set_body_json(json!([
                    {"id": 1, "matricule": "A100", "etablissement": "Lycee1"},
                    {"id": 2, "matricule": "A101", "etablissement": "Lycee1"}
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(table_path("Students")))
        .and(header("range", "2-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "2-2/3")
                .set_body_json(json!([
                    {"id": 3, "matricule": "A102", "etablissement": "Lycee1"}
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows = provider.fetch(EntityKind::Student, None).await.unwrap();

    let matricules: Vec<_> = rows.iter().map(|r| r.get_str("matricule")).collect();
    assert_eq!(matricules, vec![Some("A100"), Some("A101"), Some("A102")]);
}

#[tokio::test]
async fn test_fetch_stops_on_empty_page_when_total_unknown() {
    let (server, provider) = setup_rest_mock().await;
    let provider = provider.with_page_size(1);

    Mock::given(method("GET"))
        .and(path(table_path("Teacher")))
        .and(header("range", "0-0"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "0-0/*")
                .set_body_json(json!([{"ident": "prof1"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(table_path("Teacher")))
        .and(header("range", "1-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "*/*")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows = provider.fetch(EntityKind::Teacher, None).await.unwrap();
    assert_eq!(rows.len(), 1);
}
