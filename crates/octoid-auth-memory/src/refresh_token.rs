//! In-memory refresh token store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use tracing::debug;

use octoid_auth::storage::RefreshTokenStorage;
use octoid_auth::types::RefreshTokenRecord;
use octoid_auth::{AuthError, AuthResult};

/// Refresh token records keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStorage {
    records: DashMap<String, RefreshTokenRecord>,
}

impl InMemoryRefreshTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the record with `token_hash` revoked.
    ///
    /// Returns `false` if no such record exists.
    pub fn revoke(&self, token_hash: &str) -> bool {
        match self.records.get_mut(token_hash) {
            Some(mut record) => {
                record.revoked_at.get_or_insert_with(OffsetDateTime::now_utc);
                debug!(client_id = %record.client_id, "Refresh token revoked");
                true
            }
            None => false,
        }
    }

    /// Drops expired and revoked records, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| !record.is_expired() && !record.is_revoked());
        let purged = before.saturating_sub(self.records.len());
        if purged > 0 {
            debug!(purged, "Stale refresh tokens purged");
        }
        purged
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Revokes every token issued to `client_id`, returning the count.
    pub fn revoke_client(&self, client_id: &str) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut revoked = 0;
        for mut record in self.records.iter_mut() {
            if record.client_id == client_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        revoked
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryRefreshTokenStorage {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        match self.records.entry(record.token_hash.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("refresh token hash already exists")),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(self.records.get(token_hash).map(|entry| entry.value().clone()))
    }
}
