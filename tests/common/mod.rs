use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use confab::server::{AppState, create_router};
use confab::store::{SqliteStore, Store};

pub const ADMIN_KEY: &str = "test-admin-secret";

/// In-process app over an in-memory store. Requests go through the real
/// router via `oneshot`, no sockets involved.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_admin_key(Some(ADMIN_KEY))
    }

    pub fn spawn_with_admin_key(admin_key: Option<&str>) -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().expect("open in-memory store"));
        store.initialize().expect("initialize schema");

        let state = Arc::new(AppState::new(
            store.clone(),
            admin_key.map(String::from),
        ));

        Self {
            router: create_router(state),
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        self.request(Method::GET, uri, headers, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, uri, headers, body).await
    }

    pub async fn patch(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, headers, Some(body)).await
    }

    pub async fn put(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, headers, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, headers, None).await
    }
}

pub fn admin_headers() -> Vec<(&'static str, &'static str)> {
    vec![("X-Admin-API-Key", ADMIN_KEY)]
}
