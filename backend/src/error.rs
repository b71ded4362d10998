//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.
//!
//! Credential and token failures collapse to a fixed public message;
//! the precise reason only reaches the logs.

use crate::auth::TokenRejection;
use crate::repositories::StoreError;
use auth_service_shared::{
    ErrorResponse, INTERNAL_ERROR_MESSAGE, INVALID_CREDENTIALS_MESSAGE, INVALID_TOKEN_MESSAGE,
    MISSING_TOKEN_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenRejection),

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
            StoreError::Conflict(_) => ApiError::Internal(err.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            ApiError::MissingToken => {
                (StatusCode::UNAUTHORIZED, MISSING_TOKEN_MESSAGE.to_string())
            }
            ApiError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE.to_string())
            }
            ApiError::StoreUnavailable(msg) => {
                error!("Credential store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    SERVICE_UNAVAILABLE_MESSAGE.to_string(),
                )
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
