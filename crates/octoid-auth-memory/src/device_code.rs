//! In-memory device authorization store (RFC 8628).
//!
//! The store enforces the polling interval: a poll that arrives sooner than
//! `interval` after the previous one reports `SlowDown` while the user has
//! not decided yet.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use octoid_auth::storage::DeviceCodeStorage;
use octoid_auth::types::{DeviceAuthorization, DeviceAuthorizationStatus};
use octoid_auth::{AuthError, AuthResult};

/// Default minimum polling interval (RFC 8628 §3.2).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct DeviceEntry {
    authorization: DeviceAuthorization,
    last_polled: Option<Instant>,
    denial_reported: bool,
}

/// Device authorizations keyed by device code.
#[derive(Debug)]
pub struct InMemoryDeviceCodeStorage {
    entries: DashMap<String, DeviceEntry>,
    interval: Duration,
}

impl Default for InMemoryDeviceCodeStorage {
    fn default() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }
}

impl InMemoryDeviceCodeStorage {
    /// Creates an empty store with the default polling interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store enforcing `interval` between polls.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            interval,
        }
    }

    /// The enforced polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Records the user's approval on behalf of `subject`.
    ///
    /// Returns `false` if the device code is unknown or already decided.
    pub fn approve(&self, device_code: &str, subject: impl Into<String>) -> bool {
        self.decide(
            device_code,
            DeviceAuthorizationStatus::Approved {
                subject: subject.into(),
            },
        )
    }

    /// Records the user's denial.
    ///
    /// Returns `false` if the device code is unknown or already decided.
    pub fn deny(&self, device_code: &str) -> bool {
        self.decide(device_code, DeviceAuthorizationStatus::Denied)
    }

    /// Drops expired authorizations and denials already reported to the
    /// device, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.authorization.is_expired() && !entry.denial_reported);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Stale device authorizations purged");
        }
        purged
    }

    /// Number of stored authorizations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn decide(&self, device_code: &str, status: DeviceAuthorizationStatus) -> bool {
        let Some(mut entry) = self.entries.get_mut(device_code) else {
            return false;
        };
        if !matches!(
            entry.authorization.status,
            DeviceAuthorizationStatus::Pending | DeviceAuthorizationStatus::SlowDown
        ) {
            return false;
        }
        entry.authorization.status = status;
        debug!(client_id = %entry.authorization.client_id, "Device authorization decided");
        true
    }
}

#[async_trait]
impl DeviceCodeStorage for InMemoryDeviceCodeStorage {
    async fn create(&self, authorization: &DeviceAuthorization) -> AuthResult<()> {
        match self.entries.entry(authorization.device_code.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("device code already exists")),
            Entry::Vacant(slot) => {
                slot.insert(DeviceEntry {
                    authorization: authorization.clone(),
                    last_polled: None,
                    denial_reported: false,
                });
                Ok(())
            }
        }
    }

    async fn poll(&self, device_code: &str) -> AuthResult<Option<DeviceAuthorization>> {
        let now = Instant::now();
        let (mut authorization, too_fast) = {
            let Some(mut entry) = self.entries.get_mut(device_code) else {
                return Ok(None);
            };
            let too_fast = entry
                .last_polled
                .is_some_and(|last| now.duration_since(last) < self.interval);
            entry.last_polled = Some(now);
            if entry.authorization.status == DeviceAuthorizationStatus::Denied {
                entry.denial_reported = true;
            }
            (entry.authorization.clone(), too_fast)
        };

        match authorization.status {
            DeviceAuthorizationStatus::Approved { .. } => Ok(self
                .entries
                .remove(device_code)
                .map(|(_, entry)| entry.authorization)),
            DeviceAuthorizationStatus::Pending if too_fast => {
                authorization.status = DeviceAuthorizationStatus::SlowDown;
                Ok(Some(authorization))
            }
            _ => Ok(Some(authorization)),
        }
    }
}
