//! Tests for single-row upserts

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use bulletin_core::domain::{EntityKind, Record};
use bulletin_core::ports::IRemoteTable;

use crate::common::{setup_rest_mock, table_path, TEST_KEY};

#[tokio::test]
async fn test_upsert_posts_with_natural_key_conflict_target() {
    let (server, provider) = setup_rest_mock().await;

    let body = json!({
        "matricule": "A100",
        "matiere": "Maths",
        "classe": "6A",
        "moyenne": "12.5",
        "etablissement": "Lycee1"
    });

    Mock::given(method("POST"))
        .and(path(table_path("Notes")))
        .and(query_param("on_conflict", "matricule,matiere,classe,etablissement"))
        .and(header("prefer", "resolution=merge-duplicates,return=minimal"))
        .and(header("apikey", TEST_KEY))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let record = Record::try_from(body.clone()).unwrap();
    provider.upsert(EntityKind::Grade, &record).await.unwrap();
}

#[tokio::test]
async fn test_upsert_accepts_no_content() {
    let (server, provider) = setup_rest_mock().await;

    Mock::given(method("POST"))
        .and(path(table_path("Teacher")))
        .and(query_param("on_conflict", "ident"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let record = Record::try_from(json!({"ident": "prof1", "matiere": "SVT"})).unwrap();
    provider.upsert(EntityKind::Teacher, &record).await.unwrap();
}
