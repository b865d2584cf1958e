use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::session::session_router;
use super::user::user_router;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Shared secret for the admin header scheme. `None` means admin auth is
    /// unconfigured and every admin request reports a misconfiguration.
    pub admin_api_key: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, admin_api_key: Option<String>) -> Self {
        Self {
            store,
            admin_api_key,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/admin", admin_router())
        .nest("/user", user_router())
        .nest("/auth", session_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
