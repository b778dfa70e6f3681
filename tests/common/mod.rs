//! In-process test harness.
//!
//! Each `TestApp` owns a temp directory with its own database, so tests can
//! run in parallel. Requests go straight into the router with `oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use snowline::config::{DEFAULT_IDENTITY_HEADER, ServerConfig};
use snowline::server::{AppState, create_router};
use snowline::store::{SqliteStore, Store};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(mut config: ServerConfig) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        config.data_dir = temp_dir.path().to_path_buf();

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");

        let state = AppState::new(store.clone(), &config).expect("app state");
        let router = create_router(Arc::new(state));

        Self {
            temp_dir,
            store,
            router,
        }
    }

    /// Creates a user and returns its username.
    pub fn user(&self, username: &str) -> String {
        self.store.create_user(username, None).expect("create user")
    }

    pub fn admin(&self, username: &str) -> String {
        self.store.add_admin(username).expect("add admin")
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, as_user: Option<&str>, uri: &str) -> TestResponse {
        self.send(request("GET", uri, as_user, None)).await
    }

    pub async fn post(&self, as_user: Option<&str>, uri: &str, body: Value) -> TestResponse {
        self.send(request("POST", uri, as_user, Some(body))).await
    }

    pub async fn delete(&self, as_user: Option<&str>, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(request("DELETE", uri, as_user, body)).await
    }
}

pub fn request(method: &str, uri: &str, as_user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(username) = as_user {
        builder = builder.header(DEFAULT_IDENTITY_HEADER, username);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Collects a JSON array of strings from a response's `data` field.
pub fn strings(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|v| v.as_str().expect("string").to_string())
        .collect()
}
