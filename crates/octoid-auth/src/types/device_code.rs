//! Device authorization records (RFC 8628).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Where the user is in the device authorization flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeviceAuthorizationStatus {
    /// The user has not finished the verification step yet.
    Pending,
    /// The client polls faster than the advertised interval.
    SlowDown,
    /// The user approved the request.
    Approved {
        /// Subject that approved the device.
        subject: String,
    },
    /// The user denied the request.
    Denied,
}

/// A device authorization as returned by a
/// [`DeviceCodeStorage`](crate::storage::DeviceCodeStorage) poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorization {
    /// The device verification code.
    pub device_code: String,

    /// Client that started the flow.
    pub client_id: String,

    /// Requested scopes (space-separated).
    pub scope: String,

    /// Current status.
    #[serde(flatten)]
    pub status: DeviceAuthorizationStatus,

    /// When the device code expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl DeviceAuthorization {
    /// Returns `true` if the device code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}
