mod admin;
pub mod dto;
pub mod response;
mod router;
mod session;
mod user;
pub mod validation;

pub use admin::admin_router;
pub use router::{AppState, create_router};
pub use session::session_router;
pub use user::user_router;
