//! In-memory authorization request store.
//!
//! Codes are consumed with a single map removal, so concurrent redemptions
//! of the same code see exactly one winner.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use tracing::debug;

use octoid_auth::oauth::AuthorizationRequest;
use octoid_auth::storage::AuthorizationRequestStorage;
use octoid_auth::{AuthError, AuthResult};

/// Pending authorization requests keyed by code.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRequestStorage {
    requests: DashMap<String, AuthorizationRequest>,
}

impl InMemoryAuthorizationRequestStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired request, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.requests.len();
        self.requests.retain(|_, request| request.expires_at > now);
        let purged = before.saturating_sub(self.requests.len());
        if purged > 0 {
            debug!(purged, "Expired authorization requests purged");
        }
        purged
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` if nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[async_trait]
impl AuthorizationRequestStorage for InMemoryAuthorizationRequestStorage {
    async fn create(&self, request: &AuthorizationRequest) -> AuthResult<()> {
        match self.requests.entry(request.code.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("authorization code already exists")),
            Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn consume(&self, code: &str) -> AuthResult<Option<AuthorizationRequest>> {
        Ok(self.requests.remove(code).map(|(_, request)| request))
    }
}
