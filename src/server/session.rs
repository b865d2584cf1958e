use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};

use crate::auth::{UserApiKey, generate_token, hash_password, verify_password};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, LoginRequest, MessageResponse, SessionResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_email;
use crate::store::Store;
use crate::types::{ApiToken, DEFAULT_MAX_CONCURRENT_MEETINGS, NewToken, NewUser};

pub fn session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
}

const MAX_TOKEN_RETRIES: u32 = 3;

/// Mints and persists a fresh token for the user, retrying if the random
/// value collides with an existing row.
pub(crate) fn issue_token(store: &dyn Store, user_id: i64) -> Result<ApiToken, ApiError> {
    for _ in 0..MAX_TOKEN_RETRIES {
        let new = NewToken {
            token: generate_token(),
            user_id,
        };

        match store.create_token(&new) {
            Ok(token) => return Ok(token),
            Err(Error::TokenCollision) => continue,
            Err(_) => return Err(ApiError::internal("Failed to create token")),
        }
    }

    Err(ApiError::internal("Failed to create token after retries"))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user_by_email(&req.email)
        .api_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized("user not found"))?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let token = issue_token(state.store.as_ref(), user.id)?;
    tracing::info!("User {} (ID: {}) logged in", user.email, user.id);

    Ok(Json(ApiResponse::success(SessionResponse {
        user,
        token: token.token,
    })))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;

    if state
        .store
        .get_user_by_email(&req.email)
        .api_err("Failed to look up user")?
        .is_some()
    {
        return Err(ApiError::bad_request("user with this email already exists"));
    }

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

    let user = match state.store.create_user(&new) {
        Ok(user) => user,
        // Lost the unique-email race to a concurrent registration.
        Err(Error::AlreadyExists) => {
            return Err(ApiError::bad_request("user with this email already exists"));
        }
        Err(_) => return Err(ApiError::internal("Failed to create user")),
    };

    let token = issue_token(state.store.as_ref(), user.id)?;
    tracing::info!("Registered new user {} (ID: {})", user.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionResponse {
            user,
            token: token.token,
        })),
    ))
}

async fn logout(
    UserApiKey(key): UserApiKey,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_value(&key)
        .api_err("Failed to look up token")?
        .ok_or_else(|| ApiError::unauthorized("invalid API key"))?;

    state
        .store
        .delete_token(token.id)
        .api_err("Failed to delete token")?;
    tracing::info!("User ID {} logged out", token.user_id);

    Ok::<_, ApiError>(Json(ApiResponse::success(MessageResponse {
        message: "successfully logged out",
    })))
}
