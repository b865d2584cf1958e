use std::sync::Arc;

use axum::{
    Json,
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::Value;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{MeetingCountResponse, WebhookUpdateRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_webhook_url;
use crate::types::WEBHOOK_URL_KEY;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", put(set_webhook))
        .route("/meetings/count", get(meeting_count))
}

/// Self-service: stores the notification webhook URL under the reserved
/// metadata key, for the authenticated user only.
async fn set_webhook(
    RequireUser(mut user): RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<WebhookUpdateRequest>,
) -> impl IntoResponse {
    let webhook_url = validate_webhook_url(&req.webhook_url)?;

    user.data.insert(WEBHOOK_URL_KEY, Value::String(webhook_url));
    state
        .store
        .update_user(&user)
        .api_err("Failed to update user")?;
    tracing::info!("Updated webhook URL for user {}", user.email);

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

async fn meeting_count(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let counts = state
        .store
        .count_user_meetings(user.id)
        .api_err("Failed to count meetings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MeetingCountResponse {
        user_id: user.id,
        total_meetings: counts.total,
        by_status: counts.by_status,
    })))
}
