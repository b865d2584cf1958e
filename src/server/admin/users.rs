use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{RequireAdmin, hash_password};
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, MeetingCountResponse, PaginationParams, UpdateUserRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::session::issue_token;
use crate::server::validation::validate_email;
use crate::store::TokenLoad;
use crate::types::{DEFAULT_MAX_CONCURRENT_MEETINGS, NewUser, User};

/// How an update treats the metadata map: PATCH replaces it wholesale, PUT
/// overlays incoming keys onto the existing map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataMode {
    Replace,
    Merge,
}

pub async fn create_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;

    let hashed_password =
        hash_password(&req.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let new = NewUser {
        email: req.email,
        name: req.name,
        image_url: req.image_url,
        hashed_password,
        max_concurrent_meetings: req
            .max_concurrent_meetings
            .unwrap_or(DEFAULT_MAX_CONCURRENT_MEETINGS),
        data: req.data.unwrap_or_default(),
    };

    let (user, created) = state
        .store
        .find_or_create_user(&new)
        .api_err("Failed to find or create user")?;

    let status = if created {
        tracing::info!("Admin created user {} (ID: {})", user.email, user.id);
        StatusCode::CREATED
    } else {
        tracing::info!("Found existing user {} (ID: {})", user.email, user.id);
        StatusCode::OK
    };

    Ok::<_, ApiError>((status, Json(ApiResponse::success(user))))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.unwrap_or(0);

    let users = state
        .store
        .list_users(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list users")?;

    let (users, next_cursor, has_more) =
        paginate(users, DEFAULT_PAGE_SIZE as usize, |u| u.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(users, next_cursor, has_more)))
}

pub async fn get_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    // Detail view eager-loads the user's tokens.
    let detail = state
        .store
        .get_user(id, TokenLoad::Include)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(detail)))
}

pub async fn get_user_by_email(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user_by_email(&email)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn patch_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    update_user(&state, id, req, MetadataMode::Replace)
}

pub async fn put_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    update_user(&state, id, req, MetadataMode::Merge)
}

fn update_user(
    state: &Arc<AppState>,
    id: i64,
    req: UpdateUserRequest,
    mode: MetadataMode,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let detail = state
        .store
        .get_user(id, TokenLoad::Skip)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let mut user = detail.user;
    let changed = apply_update(&mut user, req, mode)?;

    if changed {
        state
            .store
            .update_user(&user)
            .api_err("Failed to update user")?;
        tracing::info!("Admin updated user ID: {}", user.id);
    }

    Ok(Json(ApiResponse::success(user)))
}

/// Applies the supplied fields to the user, returning whether anything
/// actually changed. Untouched fields keep their values; a no-op request
/// skips the write entirely.
fn apply_update(
    user: &mut User,
    req: UpdateUserRequest,
    mode: MetadataMode,
) -> Result<bool, ApiError> {
    if let Some(email) = req.email {
        // Email is identity; restating the current value is a silent no-op.
        if email != user.email {
            return Err(ApiError::bad_request("cannot change user email"));
        }
    }

    let mut changed = false;

    if let Some(password) = req.password {
        user.hashed_password = hash_password(&password)
            .map_err(|_| ApiError::internal("Failed to hash password"))?;
        changed = true;
    }

    if let Some(name) = req.name {
        if user.name.as_deref() != Some(name.as_str()) {
            user.name = Some(name);
            changed = true;
        }
    }

    if let Some(image_url) = req.image_url {
        if user.image_url.as_deref() != Some(image_url.as_str()) {
            user.image_url = Some(image_url);
            changed = true;
        }
    }

    if let Some(limit) = req.max_concurrent_meetings {
        if user.max_concurrent_meetings != limit {
            user.max_concurrent_meetings = limit;
            changed = true;
        }
    }

    if let Some(data) = req.data {
        match mode {
            MetadataMode::Replace => {
                if user.data != data {
                    user.data = data;
                    changed = true;
                }
            }
            MetadataMode::Merge => {
                let mut merged = user.data.clone();
                merged.merge(data);
                if merged != user.data {
                    user.data = merged;
                    changed = true;
                }
            }
        }
    }

    Ok(changed)
}

pub async fn user_meeting_count(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let detail = state
        .store
        .get_user(id, TokenLoad::Skip)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let counts = state
        .store
        .count_user_meetings(detail.user.id)
        .api_err("Failed to count meetings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MeetingCountResponse {
        user_id: detail.user.id,
        total_meetings: counts.total,
        by_status: counts.by_status,
    })))
}

pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let detail = state
        .store
        .get_user(id, TokenLoad::Skip)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let token = issue_token(state.store.as_ref(), detail.user.id)?;
    tracing::info!(
        "Admin created token for user {} (ID: {})",
        detail.user.email,
        detail.user.id
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(token))))
}
