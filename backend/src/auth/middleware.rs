//! Authentication extractors
//!
//! Pull the token out of the `Authorization` header and verify it with the
//! pre-computed keys in AppState. No store access happens here.

use super::jwt::VerifiedToken;
use crate::error::ApiError;
use crate::services::AuthService;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

/// Raw token taken from the `Authorization` header
///
/// Accepts a bare token (`Authorization: <token>`) as well as
/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::MissingToken)?;

        let token = value
            .strip_prefix("Bearer")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .map(str::trim)
            .unwrap_or(value);

        if token.is_empty() {
            return Err(ApiError::MissingToken);
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated user extracted from a verified token
#[derive(Debug, Clone)]
pub struct AuthUser(pub VerifiedToken);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let BearerToken(token) = BearerToken::from_headers(&parts.headers)?;

        let verified = AuthService::verify(app_state.tokens(), &token)?;
        Ok(AuthUser(verified))
    }
}
