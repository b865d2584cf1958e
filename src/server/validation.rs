use url::Url;

use crate::server::response::ApiError;

const MAX_EMAIL_LEN: usize = 254;

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::bad_request("email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request(format!(
            "email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::bad_request("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("email is not valid"));
    }
    Ok(())
}

/// Webhook URLs must be well-formed, absolute, and http(s). Returns the
/// normalized form for storage.
pub fn validate_webhook_url(raw: &str) -> Result<String, ApiError> {
    let url = Url::parse(raw)
        .map_err(|_| ApiError::bad_request("webhook_url must be a valid absolute URL"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::bad_request("webhook_url must use http or https"));
    }
    if url.host_str().is_none() {
        return Err(ApiError::bad_request("webhook_url must include a host"));
    }

    Ok(url.to_string())
}
