//! Refresh token metadata.
//!
//! # Security
//!
//! - Refresh tokens are stored as SHA-256 hashes, never plaintext
//! - Lookups hash the presented value first

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Refresh token record as kept by a [`RefreshTokenStorage`](crate::storage::RefreshTokenStorage).
///
/// The token itself is never stored. When validating a refresh token:
///
/// 1. Hash the incoming token
/// 2. Look up by hash
/// 3. Validate client binding, expiration and revocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// SHA-256 hash (hex) of the actual token value.
    pub token_hash: String,

    /// Client ID that this token was issued to.
    pub client_id: String,

    /// Subject that authorized this token.
    pub subject: String,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this token expires (None = no expiration).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl RefreshTokenRecord {
    /// Creates a record for `token`, hashing it.
    #[must_use]
    pub fn new(
        token: &str,
        client_id: impl Into<String>,
        subject: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            token_hash: Self::hash_token(token),
            client_id: client_id.into(),
            subject: subject.into(),
            scope: scope.into(),
            created_at: OffsetDateTime::now_utc(),
            expires_at: None,
            revoked_at: None,
        }
    }

    /// Sets the expiration instant.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| OffsetDateTime::now_utc() > exp)
            .unwrap_or(false)
    }

    /// Returns `true` if this token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Hash a token value using SHA-256.
    ///
    /// Used both when storing new tokens and when looking tokens up.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_hash_is_stable_and_hex() {
        let a = RefreshTokenRecord::hash_token("rt-value");
        let b = RefreshTokenRecord::hash_token("rt-value");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, RefreshTokenRecord::hash_token("other"));
    }

    #[test]
    fn test_new_never_keeps_plaintext() {
        let record = RefreshTokenRecord::new("rt-value", "app", "alice", "openid");
        assert_ne!(record.token_hash, "rt-value");
        assert!(!record.is_expired());
        assert!(!record.is_revoked());
    }

    #[test]
    fn test_expiration() {
        let past = OffsetDateTime::now_utc() - Duration::minutes(1);
        let record = RefreshTokenRecord::new("rt", "app", "alice", "openid").expiring_at(past);
        assert!(record.is_expired());
    }
}
