//! JWT token issuance and verification
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. Verification
//! needs no store access: structure, signature, expiry, then the revocation
//! list, in that order.

use super::revocation::RevocationList;
use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token id, unique per issued token; keys the revocation list
    pub jti: String,
    pub iss: String,
}

/// Why a token was refused. For logs only, never sent to clients.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token revoked")]
    Revoked,
}

impl TokenRejection {
    /// Short label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRejection::Malformed => "malformed",
            TokenRejection::BadSignature => "bad_signature",
            TokenRejection::Expired => "expired",
            TokenRejection::Revoked => "revoked",
        }
    }
}

/// The signing secret was missing at startup
#[derive(Error, Debug)]
#[error("signing secret is not provisioned")]
pub struct SigningUnavailable;

/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A token that passed every check
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub identity: Identity,
    pub token_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
        }
    }
}

/// Token issuer and verifier
///
/// Cheap to clone; keys, validation rules and the revocation list are shared.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Arc<Validation>,
    ttl_secs: i64,
    issuer: Arc<str>,
    revocations: Arc<RevocationList>,
}

impl TokenService {
    /// Create the service from the signing secret
    ///
    /// Fails if the secret is empty; callers treat that as fatal at startup.
    pub fn new(
        secret: &SecretString,
        ttl_secs: i64,
        issuer: &str,
    ) -> Result<Self, SigningUnavailable> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(SigningUnavailable);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in verify_at, inclusive of exp itself
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[issuer]);

        Ok(Self {
            keys: JwtKeys::new(secret.as_bytes()),
            validation: Arc::new(validation),
            ttl_secs,
            issuer: issuer.into(),
            revocations: Arc::new(RevocationList::new()),
        })
    }

    /// Issue a token for `username`, valid for the configured TTL
    #[inline]
    pub fn issue(&self, username: &str) -> Result<IssuedToken> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<IssuedToken> {
        let token_id = Uuid::new_v4();
        let iat = now.timestamp();
        let exp = iat + self.ttl_secs;

        let claims = Claims {
            sub: username.to_string(),
            iat,
            exp,
            jti: token_id.to_string(),
            iss: self.issuer.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))?;

        Ok(IssuedToken {
            token,
            token_id,
            expires_at: timestamp(exp)
                .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?,
        })
    }

    /// Verify a token against the current time
    #[inline]
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenRejection> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    ///
    /// A token is expired from the instant `now >= exp`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, TokenRejection> {
        let claims = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Token failed to decode");
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                    _ => TokenRejection::Malformed,
                }
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenRejection::Expired);
        }

        let token_id = Uuid::parse_str(&claims.jti).map_err(|_| TokenRejection::Malformed)?;

        if self.revocations.is_revoked(&token_id) {
            return Err(TokenRejection::Revoked);
        }

        Ok(VerifiedToken {
            identity: Identity {
                username: claims.sub,
            },
            token_id,
            issued_at: timestamp(claims.iat).ok_or(TokenRejection::Malformed)?,
            expires_at: timestamp(claims.exp).ok_or(TokenRejection::Malformed)?,
        })
    }

    /// Revoke a verified token until it expires
    pub fn revoke(&self, token: &VerifiedToken) {
        self.revocations.revoke(token.token_id, token.expires_at);
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn revocations(&self) -> &RevocationList {
        &self.revocations
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
