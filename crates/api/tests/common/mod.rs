//! Shared fixtures for API integration tests.
//!
//! Every test gets a fresh [`MemoryDispatchStore`] behind the real router,
//! and requests go through `tower::ServiceExt::oneshot` without a listener.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::broadcast;
use tower::ServiceExt;

use cad_api::config::{ServerConfig, StoreBackend};
use cad_api::router::build_app_router;
use cad_api::state::AppState;
use cad_api::ws::WsManager;
use cad_db::{DispatchStore, MemoryDispatchStore};
use cad_events::{DispatchEvent, EventBus};

/// A `ServerConfig` for the in-memory backend.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        store: StoreBackend::Memory,
        database_url: None,
    }
}

pub struct TestApp {
    pub store: Arc<MemoryDispatchStore>,
    pub bus: Arc<EventBus>,
    pub state: AppState,
}

impl TestApp {
    /// A router over this app's state. Cheap; build one per request.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &test_config())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.bus.subscribe()
    }
}

pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryDispatchStore::new());
    let bus = Arc::new(EventBus::default());
    let dyn_store: Arc<dyn DispatchStore> = store.clone();
    let state = AppState::new(
        dyn_store,
        test_config(),
        Arc::new(WsManager::new()),
        Arc::clone(&bus),
    );
    TestApp { store, bus, state }
}

/// Everything published on `rx` so far.
pub fn drain(rx: &mut broadcast::Receiver<DispatchEvent>) -> Vec<DispatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}
