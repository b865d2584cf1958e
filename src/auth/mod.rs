mod credential;
mod gate;
mod token;

pub use credential::{hash_password, verify_password};
pub use gate::{ADMIN_API_KEY_HEADER, API_KEY_HEADER, AuthError, RequireAdmin, RequireUser, UserApiKey};
pub use token::{TOKEN_LENGTH, generate_token};
