//! Credential store
//!
//! Key-value lookup of a username to its stored credential record.
//! The store is queried once per login and never during token verification.

pub mod credential;
pub mod memory;

pub use credential::PgCredentialStore;
pub use memory::InMemoryCredentialStore;

use async_trait::async_trait;
use thiserror::Error;

/// Stored credential for one user
///
/// `password_hash` is a PHC string (argon2) or a legacy bcrypt hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
}

/// Result of a successful upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    AlreadyExists,
}

/// Credential store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transient failure reaching the store; not retried here
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A concurrent writer provisioned the same username first
    #[error("username already provisioned: {0}")]
    Conflict(String),
}

/// Credential store trait
///
/// Implementations must be safe for concurrent use and must not cache
/// records in-process.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the record for `username`, if any
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Insert the record unless the username already exists
    ///
    /// Returns `Conflict` if a concurrent insert won the unique constraint.
    async fn upsert(&self, username: &str, password_hash: &str)
        -> Result<UpsertOutcome, StoreError>;

    /// Cheap reachability check for readiness probes
    async fn ping(&self) -> Result<(), StoreError>;
}
