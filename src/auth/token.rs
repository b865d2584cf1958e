use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;

/// Length of issued API tokens. Long enough that collisions are negligible;
/// the store's unique index on the token value is the backstop.
pub const TOKEN_LENGTH: usize = 40;

/// Mints an opaque token: fixed-length alphanumeric, drawn uniformly from
/// the OS CSPRNG. Carries no embedded metadata.
#[must_use]
pub fn generate_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
