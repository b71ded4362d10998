//! Authentication service
//!
//! Login runs `Received -> Looked-Up -> Hash-Checked -> {Issued | Rejected}`
//! with no intermediate or retry states. Verification never touches the store.
//!
//! # Performance
//!
//! - Password verification runs on the blocking thread pool
//! - Token operations use the pre-computed keys in `TokenService`

use crate::auth::{IssuedToken, PasswordService, TokenService, VerifiedToken};
use crate::error::ApiError;
use crate::repositories::{CredentialStore, StoreError, UpsertOutcome};
use anyhow::Result;
use metrics::counter;
use tracing::{error, info, warn};

/// Authentication operations
pub struct AuthService;

impl AuthService {
    /// Check a username/password pair and mint a token
    ///
    /// Unknown users and wrong passwords both cost one full hash
    /// verification and both return `InvalidCredentials`.
    pub async fn login(
        store: &dyn CredentialStore,
        passwords: &PasswordService,
        tokens: &TokenService,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, ApiError> {
        let record = store.lookup(username).await.map_err(|e| {
            counter!("auth_login_total", "outcome" => "store_error").increment(1);
            ApiError::from(e)
        })?;

        let accepted = match record {
            Some(record) => {
                match passwords
                    .verify_async(password.to_string(), record.password_hash)
                    .await
                {
                    Ok(true) => true,
                    Ok(false) => {
                        warn!(username, "Login rejected: wrong password");
                        false
                    }
                    Err(e) => {
                        error!(username, error = %e, "Login rejected: stored credential unusable");
                        false
                    }
                }
            }
            None => {
                passwords.verify_dummy_async(password.to_string()).await;
                warn!(username, "Login rejected: unknown user");
                false
            }
        };

        if !accepted {
            counter!("auth_login_total", "outcome" => "rejected").increment(1);
            return Err(ApiError::InvalidCredentials);
        }

        let issued = tokens.issue(username)?;
        counter!("auth_login_total", "outcome" => "issued").increment(1);
        info!(username, token_id = %issued.token_id, "Token issued");

        Ok(issued)
    }

    /// Validate a token without consulting the credential store
    pub fn verify(tokens: &TokenService, token: &str) -> Result<VerifiedToken, ApiError> {
        match tokens.verify(token) {
            Ok(verified) => {
                counter!("auth_verify_total", "outcome" => "valid").increment(1);
                Ok(verified)
            }
            Err(reason) => {
                counter!("auth_verify_total", "outcome" => reason.as_str()).increment(1);
                warn!(reason = reason.as_str(), "Token rejected");
                Err(ApiError::InvalidToken(reason))
            }
        }
    }

    /// Revoke a verified token for the rest of its lifetime
    pub fn logout(tokens: &TokenService, verified: &VerifiedToken) {
        tokens.revoke(verified);
        info!(
            username = %verified.identity.username,
            token_id = %verified.token_id,
            "Token revoked"
        );
    }

    /// Provision the default account if it does not exist yet
    ///
    /// Safe to run on every startup and from several replicas at once:
    /// an existing record or a lost insert race both count as provisioned.
    pub async fn bootstrap_default_account(
        store: &dyn CredentialStore,
        passwords: &PasswordService,
        username: &str,
        password: &str,
    ) -> Result<UpsertOutcome> {
        if store.lookup(username).await?.is_some() {
            info!(username, "Default account already provisioned");
            return Ok(UpsertOutcome::AlreadyExists);
        }

        let hash = passwords.hash_async(password.to_string()).await?;

        match store.upsert(username, &hash).await {
            Ok(UpsertOutcome::Created) => {
                warn!(
                    username,
                    "Default account created; rotate its password or disable bootstrap"
                );
                Ok(UpsertOutcome::Created)
            }
            Ok(UpsertOutcome::AlreadyExists) | Err(StoreError::Conflict(_)) => {
                info!(username, "Default account already provisioned");
                Ok(UpsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenRejection;
    use crate::repositories::{CredentialRecord, InMemoryCredentialStore};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct Fixture {
        store: InMemoryCredentialStore,
        passwords: PasswordService,
        tokens: TokenService,
    }

    impl Fixture {
        async fn new() -> Self {
            let fixture = Self {
                store: InMemoryCredentialStore::new(),
                passwords: PasswordService::for_tests(),
                tokens: TokenService::new(
                    &SecretString::new("service-test-secret".to_string()),
                    600,
                    "auth-service",
                )
                .unwrap(),
            };
            AuthService::bootstrap_default_account(
                &fixture.store,
                &fixture.passwords,
                "admin",
                "admin123",
            )
            .await
            .unwrap();
            fixture
        }

        async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, ApiError> {
            AuthService::login(&self.store, &self.passwords, &self.tokens, username, password).await
        }
    }

    /// Store whose backend is unreachable
    struct DownStore;

    #[async_trait]
    impl CredentialStore for DownStore {
        async fn lookup(&self, _: &str) -> Result<Option<CredentialRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn upsert(&self, _: &str, _: &str) -> Result<UpsertOutcome, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    /// Store where another replica always wins the insert race
    struct RacingStore;

    #[async_trait]
    impl CredentialStore for RacingStore {
        async fn lookup(&self, _: &str) -> Result<Option<CredentialRecord>, StoreError> {
            Ok(None)
        }

        async fn upsert(&self, username: &str, _: &str) -> Result<UpsertOutcome, StoreError> {
            Err(StoreError::Conflict(username.to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_then_verify_recovers_username() {
        let fixture = Fixture::new().await;

        let issued = fixture.login("admin", "admin123").await.unwrap();
        let verified = AuthService::verify(&fixture.tokens, &issued.token).unwrap();

        assert_eq!(verified.identity.username, "admin");
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let fixture = Fixture::new().await;
        let result = fixture.login("admin", "wrong").await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_like_wrong_password() {
        let fixture = Fixture::new().await;
        let result = fixture.login("nobody", "admin123").await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_user_costs_one_hash_verification() {
        let fixture = Fixture::new().await;

        let before = fixture.passwords.verifications();
        let _ = fixture.login("admin", "wrong").await;
        let after_wrong_password = fixture.passwords.verifications();
        let _ = fixture.login("nobody", "admin123").await;
        let after_unknown_user = fixture.passwords.verifications();

        assert_eq!(after_wrong_password - before, 1);
        assert_eq!(after_unknown_user - after_wrong_password, 1);
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_rejected_as_credentials() {
        let fixture = Fixture::new().await;
        fixture.store.upsert("broken", "not-a-hash").await.unwrap();

        let result = fixture.login("broken", "anything").await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_legacy_bcrypt_record_can_log_in() {
        let fixture = Fixture::new().await;
        let legacy = bcrypt::hash("old-password", 4).unwrap();
        fixture.store.upsert("legacy", &legacy).await.unwrap();

        assert!(fixture.login("legacy", "old-password").await.is_ok());
    }

    #[tokio::test]
    async fn test_store_outage_is_unavailable_not_unauthorized() {
        let passwords = PasswordService::for_tests();
        let tokens = TokenService::new(
            &SecretString::new("service-test-secret".to_string()),
            600,
            "auth-service",
        )
        .unwrap();

        let result = AuthService::login(&DownStore, &passwords, &tokens, "admin", "admin123").await;
        assert!(matches!(result, Err(ApiError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_verify_reports_reason() {
        let fixture = Fixture::new().await;
        let result = AuthService::verify(&fixture.tokens, "garbage");
        assert!(matches!(
            result,
            Err(ApiError::InvalidToken(TokenRejection::Malformed))
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_token() {
        let fixture = Fixture::new().await;
        let first = fixture.login("admin", "admin123").await.unwrap();
        let second = fixture.login("admin", "admin123").await.unwrap();

        let verified = AuthService::verify(&fixture.tokens, &first.token).unwrap();
        AuthService::logout(&fixture.tokens, &verified);

        assert!(matches!(
            AuthService::verify(&fixture.tokens, &first.token),
            Err(ApiError::InvalidToken(TokenRejection::Revoked))
        ));
        assert!(AuthService::verify(&fixture.tokens, &second.token).is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_logins_yield_distinct_valid_tokens() {
        let fixture = Arc::new(Fixture::new().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fixture = Arc::clone(&fixture);
                tokio::spawn(async move { fixture.login("admin", "admin123").await })
            })
            .collect();

        let mut tokens = HashSet::new();
        for handle in handles {
            let issued = handle.await.unwrap().unwrap();
            let verified = AuthService::verify(&fixture.tokens, &issued.token).unwrap();
            assert_eq!(verified.identity.username, "admin");
            tokens.insert(issued.token);
        }
        assert_eq!(tokens.len(), 8);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let fixture = Fixture::new().await;

        let outcome = AuthService::bootstrap_default_account(
            &fixture.store,
            &fixture.passwords,
            "admin",
            "admin123",
        )
        .await
        .unwrap();

        assert_eq!(outcome, UpsertOutcome::AlreadyExists);
        assert_eq!(fixture.store.len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_conflict_counts_as_provisioned() {
        let passwords = PasswordService::for_tests();
        let outcome =
            AuthService::bootstrap_default_account(&RacingStore, &passwords, "admin", "admin123")
                .await
                .unwrap();

        assert_eq!(outcome, UpsertOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_bootstrap_fails_when_store_down() {
        let passwords = PasswordService::for_tests();
        let result =
            AuthService::bootstrap_default_account(&DownStore, &passwords, "admin", "admin123")
                .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_stores_hash_not_plaintext() {
        let fixture = Fixture::new().await;
        let record = fixture.store.lookup("admin").await.unwrap().unwrap();

        assert_ne!(record.password_hash, "admin123");
        assert!(record.password_hash.starts_with("$argon2id$"));
    }
}
