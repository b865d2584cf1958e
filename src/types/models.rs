use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Metadata;

/// Concurrency limit applied when a user is created without one.
pub const DEFAULT_MAX_CONCURRENT_MEETINGS: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Identity. Unique and immutable after creation.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip)]
    pub hashed_password: String,
    pub max_concurrent_meetings: i64,
    pub data: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub hashed_password: String,
    pub max_concurrent_meetings: i64,
    pub data: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: i64,
    /// Opaque random value presented in the X-API-Key header.
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub token: String,
    pub user_id: i64,
}

/// A user plus, optionally, their issued tokens (eager-loaded detail view).
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_tokens: Option<Vec<ApiToken>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Requested,
    Active,
    Stopping,
    Completed,
    Failed,
}

impl MeetingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MeetingStatus::Requested => "requested",
            MeetingStatus::Active => "active",
            MeetingStatus::Stopping => "stopping",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requested" => Some(MeetingStatus::Requested),
            "active" => Some(MeetingStatus::Active),
            "stopping" => Some(MeetingStatus::Stopping),
            "completed" => Some(MeetingStatus::Completed),
            "failed" => Some(MeetingStatus::Failed),
            _ => None,
        }
    }
}

/// Owned by exactly one user. This service only reads and aggregates
/// meetings; the rest of the platform writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub user_id: i64,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_meeting_id: Option<String>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub user_id: i64,
    pub platform: String,
    pub native_meeting_id: Option<String>,
    pub status: MeetingStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MeetingStatusCounts {
    pub requested: i64,
    pub active: i64,
    pub stopping: i64,
    pub completed: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MeetingCounts {
    pub total: i64,
    pub by_status: MeetingStatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingWithUser {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub user: User,
}
