use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use folio_core::block::BlockContent;
use folio_core::content::{ContentStatus, Document, DocumentMetadata};
use folio_core::versioning::{InMemoryStore, VersioningEngine};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use folio_api::config::{ServerConfig, VersioningConfig};
use folio_api::router::build_app_router;
use folio_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        versioning: VersioningConfig {
            keep_count: 3,
            ..VersioningConfig::default()
        },
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Returns the store as well so tests can seed documents and inspect
/// committed state directly.
pub fn build_test_app() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let config = test_config();
    let state = AppState {
        engine: VersioningEngine::new(Arc::new(store.clone())),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

/// Seed a two-block "Draft" document.
pub async fn seed_document(store: &InMemoryStore) -> Document {
    store
        .create_document(
            DocumentMetadata {
                title: "Draft".to_string(),
                description: None,
                content_type: "article".to_string(),
                author: "ann".to_string(),
                tags: vec!["news".to_string()],
                category: None,
                featured: false,
                image_url: None,
                status: ContentStatus::Draft,
                slug: "draft".to_string(),
            },
            vec![
                BlockContent::paragraph("intro"),
                BlockContent::heading("H1", 1),
            ],
        )
        .await
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
