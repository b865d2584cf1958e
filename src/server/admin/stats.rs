use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::PaginationParams;
use crate::server::response::{
    ApiError, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
};

/// Meetings joined with their owning users, newest first. Gives operators a
/// platform-wide usage overview.
pub async fn list_meetings(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.unwrap_or(i64::MAX);

    let meetings = state
        .store
        .list_meetings_with_users(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list meetings")?;

    let (meetings, next_cursor, has_more) =
        paginate(meetings, DEFAULT_PAGE_SIZE as usize, |m| {
            m.meeting.id.to_string()
        });

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        meetings,
        next_cursor,
        has_more,
    )))
}
