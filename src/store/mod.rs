mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Whether a user lookup should eager-load the user's issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLoad {
    Skip,
    Include,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, new: &NewUser) -> Result<User>;
    /// Returns the existing user for the email, or creates one. The bool is
    /// true when a row was created. Atomic: a concurrent create for the same
    /// email resolves to "found" instead of a second row.
    fn find_or_create_user(&self, new: &NewUser) -> Result<(User, bool)>;
    fn get_user(&self, id: i64, tokens: TokenLoad) -> Result<Option<UserDetail>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: i64, limit: i64) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<()>;

    // Token operations
    fn create_token(&self, new: &NewToken) -> Result<ApiToken>;
    fn get_token_by_id(&self, id: i64) -> Result<Option<ApiToken>>;
    fn get_token_by_value(&self, token: &str) -> Result<Option<ApiToken>>;
    fn list_user_tokens(&self, user_id: i64) -> Result<Vec<ApiToken>>;
    fn delete_token(&self, id: i64) -> Result<bool>;

    // Meeting operations (read/aggregate surface; the platform writes rows)
    fn create_meeting(&self, new: &NewMeeting) -> Result<Meeting>;
    fn count_user_meetings(&self, user_id: i64) -> Result<MeetingCounts>;
    fn list_meetings_with_users(&self, cursor: i64, limit: i64) -> Result<Vec<MeetingWithUser>>;
}
