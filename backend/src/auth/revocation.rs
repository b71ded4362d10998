//! Token revocation list
//!
//! Process-local set of revoked token ids. An entry only has to outlive the
//! token it blocks, so entries are dropped once their `exp` passes.
//! Tokens stay valid on other replicas until natural expiry.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct RevocationList {
    /// token id -> expiry (unix seconds)
    entries: RwLock<HashMap<Uuid, i64>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token until its natural expiry
    pub fn revoke(&self, token_id: Uuid, expires_at: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(token_id, expires_at.timestamp());
    }

    pub fn is_revoked(&self, token_id: &Uuid) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(token_id)
    }

    /// Drop entries whose tokens have expired anyway
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        let now = now.timestamp();
        entries.retain(|_, exp| *exp > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_list_is_empty() {
        let list = RevocationList::new();
        assert!(list.is_empty());
        assert!(!list.is_revoked(&Uuid::new_v4()));
    }

    #[test]
    fn test_revoke_marks_only_that_token() {
        let list = RevocationList::new();
        let revoked = Uuid::new_v4();
        list.revoke(revoked, Utc::now() + Duration::hours(1));

        assert!(list.is_revoked(&revoked));
        assert!(!list.is_revoked(&Uuid::new_v4()));
    }

    #[test]
    fn test_purge_drops_only_expired_entries() {
        let list = RevocationList::new();
        let now = Utc::now();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        list.revoke(stale, now - Duration::seconds(1));
        list.revoke(live, now + Duration::minutes(5));

        assert_eq!(list.purge_expired(now), 1);
        assert!(!list.is_revoked(&stale));
        assert!(list.is_revoked(&live));
    }

    #[test]
    fn test_purge_treats_expiry_instant_as_expired() {
        let list = RevocationList::new();
        let now = Utc::now();
        list.revoke(Uuid::new_v4(), now);
        assert_eq!(list.purge_expired(now), 1);
    }
}
