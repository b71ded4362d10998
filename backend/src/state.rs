//! Application state management
//!
//! Every component the gateway drives is constructed once at startup and
//! injected here; handlers reach them through Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys and the dummy password hash are created once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: The signing secret is read-only for the process lifetime

use crate::auth::{PasswordService, TokenService};
use crate::config::AppConfig;
use crate::repositories::CredentialStore;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Credential store adapter (Postgres or in-memory)
    pub store: Arc<dyn CredentialStore>,
    /// Argon2 hasher with its pre-computed dummy hash
    pub passwords: PasswordService,
    /// Token issuer/verifier with cached keys
    pub tokens: TokenService,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Prometheus recorder handle, when one is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails when the signing secret is missing or the argon2 parameters
    /// are invalid; both abort startup.
    pub fn new(store: Arc<dyn CredentialStore>, config: AppConfig) -> Result<Self> {
        let tokens = TokenService::new(
            &config.token.secret,
            config.token.ttl_secs,
            &config.token.issuer,
        )?;
        let passwords = PasswordService::new(&config.password)?;

        Ok(Self {
            store,
            passwords,
            tokens,
            config: Arc::new(config),
            metrics: None,
        })
    }

    /// Attach a Prometheus handle so `/metrics` is served
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the credential store
    #[inline]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    #[inline]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordConfig;
    use crate::repositories::InMemoryCredentialStore;
    use secrecy::SecretString;

    fn test_config() -> AppConfig {
        AppConfig {
            password: PasswordConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_state_clone_shares_components() {
        let state = AppState::new(Arc::new(InMemoryCredentialStore::new()), test_config()).unwrap();
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.store, &cloned.store));
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
    }

    #[test]
    fn test_token_service_is_precomputed() {
        let state = AppState::new(Arc::new(InMemoryCredentialStore::new()), test_config()).unwrap();

        let issued = state.tokens().issue("admin").unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(state.tokens().ttl_secs(), 3600);
    }

    #[test]
    fn test_missing_secret_refuses_to_build() {
        let mut config = test_config();
        config.token.secret = SecretString::new(String::new());

        let result = AppState::new(Arc::new(InMemoryCredentialStore::new()), config);
        assert!(result.is_err());
    }
}
