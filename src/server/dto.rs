use serde::{Deserialize, Serialize};

use crate::types::{Metadata, MeetingStatusCounts, User};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub max_concurrent_meetings: Option<i64>,
    #[serde(default)]
    pub data: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login and register: the principal plus a freshly minted token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

/// Partial update. Absent fields stay untouched; `email` may only restate
/// the current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub max_concurrent_meetings: Option<i64>,
    #[serde(default)]
    pub data: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookUpdateRequest {
    pub webhook_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeetingCountResponse {
    pub user_id: i64,
    pub total_meetings: i64,
    pub by_status: MeetingStatusCounts,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<i64>,
}
