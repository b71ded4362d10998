//! API request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Login request
///
/// Both fields are capped at 1024 characters so a single request cannot feed
/// megabytes into the password hasher.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, max = 1024, message = "username is required"),
        custom(function = "printable_username")
    )]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "password is required"))]
    pub password: String,
}

/// Usernames are stored as database text, which cannot hold NUL, so any
/// control character is refused before it reaches the store.
fn printable_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(char::is_control) {
        let mut error = ValidationError::new("control_character");
        error.message = Some("username contains control characters".into());
        return Err(error);
    }
    Ok(())
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Successful verification response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub message: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// API error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
