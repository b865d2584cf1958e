use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};

/// Revokes a token by its storage id (not its value). Deleting an already
/// deleted token is a plain 404.
pub async fn delete_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    state
        .store
        .delete_token(token.id)
        .api_err("Failed to delete token")?;
    tracing::info!("Admin deleted token ID: {}", token.id);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
