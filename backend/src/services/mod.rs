//! Business logic services
//!
//! Services sequence the credential store, password hasher and token
//! service; route handlers only translate their outcomes.

pub mod auth;

pub use auth::AuthService;
