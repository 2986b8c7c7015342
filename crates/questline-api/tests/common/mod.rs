//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use questline_core::clock::Clock;
use questline_core::store::MemoryDocumentStore;
use questline_dialogue::application::catalog_loader::CatalogLoader;
use questline_dialogue::domain::catalog::{Catalog, CatalogFormat};
use questline_test_support::{FIXTURE_CATALOG_JSON, FixedClock};
use tower::ServiceExt;

use questline_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over a fresh memory store and the fixture
/// catalog. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    let catalog = Catalog::parse(FIXTURE_CATALOG_JSON, CatalogFormat::Json).unwrap();
    let app_state = AppState::new(
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(CatalogLoader::preloaded(Arc::new(catalog))),
        fixed_clock(),
        Duration::from_secs(3600),
    );
    questline_api::build_router(app_state)
}

/// Send a POST request with an optional JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method("POST").uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Status of `quest_id` in a quest log JSON body.
pub fn status_of<'a>(quest_log: &'a serde_json::Value, quest_id: &str) -> &'a str {
    quest_log["quests"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["id"] == quest_id)
        .and_then(|q| q["status"].as_str())
        .unwrap()
}
