//! Authentication module
//!
//! Argon2 password hashing, HS256 token issuance/verification and the
//! process-local revocation list.

mod jwt;
mod middleware;
mod password;
mod revocation;

pub use jwt::{
    Claims, Identity, IssuedToken, SigningUnavailable, TokenRejection, TokenService,
    VerifiedToken,
};
pub use middleware::{AuthUser, BearerToken};
pub use password::PasswordService;
pub use revocation::RevocationList;
