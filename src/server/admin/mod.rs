mod stats;
mod tokens;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/email/{email}", get(users::get_user_by_email))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", patch(users::patch_user))
        .route("/users/{id}", put(users::put_user))
        .route("/users/{id}/tokens", post(users::create_user_token))
        .route(
            "/users/{id}/meetings/count",
            get(users::user_meeting_count),
        )
        // Token routes
        .route("/tokens/{id}", delete(tokens::delete_token))
        // Usage stats
        .route("/stats/meetings", get(stats::list_meetings))
}
