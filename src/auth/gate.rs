use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;
use crate::store::TokenLoad;
use crate::types::User;

/// Header carrying the server-wide admin shared secret.
pub const ADMIN_API_KEY_HEADER: &str = "x-admin-api-key";

/// Header carrying a per-user opaque API token.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor that requires the admin shared secret.
///
/// Admin auth is compared against the value injected into [`AppState`] at
/// construction. An unset value is a deployment error and rejects every
/// admin request with a 500, distinct from a mismatch's 403.
pub struct RequireAdmin;

/// Extractor that resolves an `X-API-Key` token to its owning user.
///
/// Resource-level scoping (e.g. "does this meeting belong to this user")
/// stays with the handler; the gate only authenticates.
pub struct RequireUser(pub User);

/// Raw `X-API-Key` value. Rejects only when the header is absent; the
/// handler decides what an unknown token means (logout wants a 401, not
/// the gate's 403).
pub struct UserApiKey(pub String);

#[derive(Debug)]
pub enum AuthError {
    AdminNotConfigured,
    InvalidAdminKey,
    MissingApiKey,
    InvalidApiKey,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::AdminNotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "admin authentication is not configured on the server",
            ),
            AuthError::InvalidAdminKey => {
                (StatusCode::FORBIDDEN, "invalid or missing admin token")
            }
            AuthError::MissingApiKey => (StatusCode::UNAUTHORIZED, "missing API key"),
            AuthError::InvalidApiKey => (StatusCode::FORBIDDEN, "invalid API key"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });
        (status, Json(body)).into_response()
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|h| h.to_str().ok())
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(configured) = state.admin_api_key.as_deref() else {
            tracing::error!("admin API key not configured; rejecting admin request");
            return Err(AuthError::AdminNotConfigured);
        };

        match header_value(parts, ADMIN_API_KEY_HEADER) {
            Some(supplied) if supplied == configured => Ok(RequireAdmin),
            Some(_) => {
                tracing::warn!("invalid admin token presented");
                Err(AuthError::InvalidAdminKey)
            }
            None => Err(AuthError::InvalidAdminKey),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let key = header_value(parts, API_KEY_HEADER).ok_or(AuthError::MissingApiKey)?;

        let token = state
            .store
            .get_token_by_value(key)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::InvalidApiKey)?;

        let detail = state
            .store
            .get_user(token.user_id, TokenLoad::Skip)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::InvalidApiKey)?;

        Ok(RequireUser(detail.user))
    }
}

impl FromRequestParts<Arc<AppState>> for UserApiKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        header_value(parts, API_KEY_HEADER)
            .map(|key| UserApiKey(key.to_string()))
            .ok_or(AuthError::MissingApiKey)
    }
}
