#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use fleetflow_api::config::ServerConfig;
use fleetflow_api::router::build_app_router;
use fleetflow_api::state::AppState;
use fleetflow_db::DbPool;
use fleetflow_events::delivery::webhook::WebhookError;
use fleetflow_events::{CompletionNotifier, EventBus, LoadCompletion, NotifyError};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        ..ServerConfig::default()
    }
}

/// Build the full application router over a fresh store with a recording
/// notifier.
pub fn build_test_app() -> (Router, DbPool, Arc<RecordingNotifier>) {
    let pool = fleetflow_db::create_pool();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = build_test_app_with(pool.clone(), notifier.clone());
    (app, pool, notifier)
}

/// Build the full application router over `pool`, sending completions to
/// `notifier`.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app_with(pool: DbPool, notifier: Arc<dyn CompletionNotifier>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        event_bus: Arc::new(EventBus::default()),
        notifier,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Records every completion it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<LoadCompletion>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<LoadCompletion> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `count` completions have arrived, or give up
    /// after a short deadline and return what was seen.
    pub async fn wait_for(&self, count: usize) -> Vec<LoadCompletion> {
        for _ in 0..50 {
            if self.calls.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.calls()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify_load_complete(&self, completion: &LoadCompletion) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(completion.clone());
        Ok(())
    }
}

/// Always fails, counting attempts.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl CompletionNotifier for FailingNotifier {
    async fn notify_load_complete(&self, _: &LoadCompletion) -> Result<(), NotifyError> {
        *self.attempts.lock().unwrap() += 1;
        Err(NotifyError::Webhook(WebhookError::HttpStatus(500)))
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
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

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
