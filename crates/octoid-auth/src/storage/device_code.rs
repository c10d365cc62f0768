//! Device authorization storage trait (RFC 8628).

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::DeviceAuthorization;

/// Storage trait for device authorizations.
#[async_trait]
pub trait DeviceCodeStorage: Send + Sync {
    /// Stores a new device authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization cannot be stored.
    async fn create(&self, authorization: &DeviceAuthorization) -> AuthResult<()>;

    /// Records a poll of `device_code` and returns its current state.
    ///
    /// The store decides pacing: a poll arriving before the advertised
    /// interval elapsed reports
    /// [`SlowDown`](crate::types::DeviceAuthorizationStatus::SlowDown).
    /// An approved authorization is handed out once and removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn poll(&self, device_code: &str) -> AuthResult<Option<DeviceAuthorization>>;
}
