//! End-to-end runs over real HTTP against an `httpmock` server.

use std::sync::Arc;

use expensync_client::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use expensync_client::{
    ApiClient, ClientConfig, ClientContext, FileStore, KeyValueStore, SessionStore,
};
use httpmock::MockServer;
use httpmock::prelude::*;
use serde_json::json;

fn config_for(server: &MockServer) -> ClientConfig {
    let config = ClientConfig::from_lookup(|key| {
        (key == "EXPENSYNC_API_URL").then(|| server.base_url())
    })
    .expect("config");
    assert!(config.base_url().as_str().ends_with("/api/v1"));
    config
}

#[tokio::test]
async fn refresh_round_trip_persists_to_the_session_file() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start_async().await;
    let stale = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/budgets")
            .header("authorization", "Bearer stale");
        then.status(401).json_body(json!({"msg": "jwt expired"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/auth/refresh-token")
            .json_body(json!({"refreshToken": "r1"}));
        then.status(200)
            .json_body(json!({"accessToken": "fresh", "refreshToken": "r2"}));
    });
    let fresh = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/budgets")
            .header("authorization", "Bearer fresh");
        then.status(200)
            .json_body(json!([{"_id": "b1", "category": "Food", "amount": 250.0}]));
    });

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    let store = Arc::new(FileStore::open(&path)?);
    store.apply(&[(ACCESS_TOKEN_KEY, Some("stale")), (REFRESH_TOKEN_KEY, Some("r1"))])?;

    let client = ApiClient::new(
        config_for(&server),
        ClientContext::new(SessionStore::new(store)),
    )?;
    let budgets = client.fetch_budgets().await?;
    assert_eq!(budgets[0].category, "Food");

    stale.assert_hits(1);
    refresh.assert_hits(1);
    fresh.assert_hits(1);

    let reopened = SessionStore::new(Arc::new(FileStore::open(&path)?));
    assert_eq!(reopened.access_token().as_deref(), Some("fresh"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("r2"));
    Ok(())
}

#[tokio::test]
async fn liveness_check_hits_the_versioned_root() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start_async().await;
    let root = server.mock(|when, then| {
        when.method(GET).path("/api/v1");
        then.status(200)
            .json_body(json!({"message": "Expense Tracker API is running"}));
    });

    let client = ApiClient::new(config_for(&server), ClientContext::default())?;
    let status = client.check_backend().await;
    assert_eq!(status.message, "Expense Tracker API is running");
    root.assert();
    Ok(())
}

#[tokio::test]
async fn export_returns_raw_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start_async().await;
    let export = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/transactions/export")
            .query_param("format", "pdf");
        then.status(200)
            .header("content-type", "application/pdf")
            .header("content-disposition", "attachment; filename=\"report.pdf\"")
            .body(b"%PDF-1.7".to_vec());
    });

    let client = ApiClient::new(config_for(&server), ClientContext::default())?;
    let file = client
        .export_transactions(&expensync_api_models::ExportQuery::default())
        .await?;
    export.assert();
    assert_eq!(file.bytes, b"%PDF-1.7");
    assert_eq!(file.file_name.as_deref(), Some("report.pdf"));
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    Ok(())
}
