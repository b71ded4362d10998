//! Authentication routes
//!
//! Provides the login, verify and logout endpoints.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::AuthService;
use crate::state::AppState;
use auth_service_shared::{LoginRequest, TokenResponse, VerifyResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::debug;
use validator::Validate;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verify", post(verify))
        .route("/logout", post(logout))
}

/// Login with username and password
///
/// POST /login
///
/// # Performance
/// Password verification is offloaded to blocking thread pool.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected login payload");
        ApiError::Validation("invalid request payload".to_string())
    })?;
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let issued = AuthService::login(
        state.store(),
        state.passwords(),
        state.tokens(),
        &req.username,
        &req.password,
    )
    .await?;

    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens().ttl_secs(),
    }))
}

/// Check a token
///
/// POST /verify
///
/// # Authentication
/// Token in the Authorization header, bare or with a `Bearer ` prefix.
async fn verify(AuthUser(verified): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "token is valid".to_string(),
        subject: verified.identity.username,
        expires_at: verified.expires_at,
    })
}

/// Revoke the presented token
///
/// POST /logout
async fn logout(State(state): State<AppState>, AuthUser(verified): AuthUser) -> StatusCode {
    AuthService::logout(state.tokens(), &verified);
    StatusCode::NO_CONTENT
}
