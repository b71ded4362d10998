//! Public error messages for the auth service
//!
//! Responses only ever carry these strings. The precise failure reason
//! stays in the server logs.

/// Message returned for every credential failure.
///
/// Unknown users and wrong passwords must produce byte-identical responses.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";

/// Message returned for every rejected token, whatever the real reason.
pub const INVALID_TOKEN_MESSAGE: &str = "invalid or expired token";

/// Message returned when a protected request carries no token.
pub const MISSING_TOKEN_MESSAGE: &str = "missing authorization token";

pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "service temporarily unavailable";

pub const INTERNAL_ERROR_MESSAGE: &str = "an internal error occurred";
