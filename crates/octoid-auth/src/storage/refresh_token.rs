//! Refresh token storage trait.
//!
//! Tokens are stored as SHA-256 hashes (see
//! [`RefreshTokenRecord::hash_token`]); lookups are by hash.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::RefreshTokenRecord;

/// Storage trait for refresh token metadata.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Stores a refresh token record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Finds a refresh token by its hash.
    ///
    /// Revoked and expired records are returned as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>>;
}
