//! Password hashing using argon2
//!
//! Provides salted, adaptive hashing and constant-time verification.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Request handlers use the
//! `_async` variants, which run on the blocking thread pool.

use crate::config::PasswordConfig;
use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prefixes of bcrypt hashes written by earlier deployments
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Password hashing service
///
/// Uses Argon2id which is the recommended variant for password hashing.
/// Salt and cost parameters are embedded in every hash it produces, so
/// verification needs nothing but the stored string.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Hash of a random throwaway password, verified against when the
    /// username is unknown so both failure paths cost the same.
    dummy_hash: Arc<str>,
    /// Hash verifications actually run, dummy ones included; shared by clones
    verifications: Arc<AtomicU64>,
}

impl PasswordService {
    /// Build the service and pre-compute the dummy hash
    ///
    /// Call once at startup; the dummy hash costs one full argon2 run.
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let throwaway = SaltString::generate(&mut OsRng);
        let dummy_hash = hash_with(&argon2, throwaway.as_str())?;

        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
            verifications: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Hash a password using argon2 (blocking operation)
    ///
    /// A fresh salt is generated per call.
    pub fn hash(&self, password: &str) -> Result<String> {
        hash_with(&self.argon2, password)
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored hash (blocking operation)
    ///
    /// Accepts argon2 PHC strings and legacy bcrypt hashes. Returns an error
    /// only when the stored hash itself is unusable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        if BCRYPT_PREFIXES.iter().any(|prefix| hash.starts_with(prefix)) {
            let matched = bcrypt::verify(password, hash)
                .map_err(|e| anyhow::anyhow!("Invalid bcrypt hash: {}", e))?;
            self.verifications.fetch_add(1, Ordering::Relaxed);
            return Ok(matched);
        }

        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        let matched = self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        self.verifications.fetch_add(1, Ordering::Relaxed);
        Ok(matched)
    }

    /// Number of completed hash verifications since construction
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Burn one verification against the dummy hash. Always false.
    pub async fn verify_dummy_async(&self, password: String) -> bool {
        let hash = self.dummy_hash.to_string();
        let _ = self.verify_async(password, hash).await;
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

#[cfg(test)]
impl PasswordService {
    /// Cheap parameters so the suite stays fast
    pub(crate) fn for_tests() -> Self {
        Self::new(&PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }
}
