//! In-memory credential store
//!
//! Used by tests and by the `memory` backend for local runs. Contents are
//! lost on restart.

use super::{CredentialRecord, CredentialStore, StoreError, UpsertOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(username).map(|hash| CredentialRecord {
            username: username.to_string(),
            password_hash: hash.clone(),
        }))
    }

    async fn upsert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(username) {
            return Ok(UpsertOutcome::AlreadyExists);
        }
        records.insert(username.to_string(), password_hash.to_string());
        Ok(UpsertOutcome::Created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
