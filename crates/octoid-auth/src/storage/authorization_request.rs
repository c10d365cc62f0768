//! Authorization request storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Support efficient lookup by authorization code
//! - Make `consume` atomic so a code is redeemed at most once
//! - Drop expired requests periodically
//!
//! # Security Considerations
//!
//! - Never log authorization codes
//! - Ensure consume is atomic to prevent replay under concurrency

use async_trait::async_trait;

use crate::AuthResult;
use crate::oauth::session::AuthorizationRequest;

/// Storage trait for authorization requests.
///
/// Requests are created when the authorization endpoint issues a code and
/// consumed when the code is exchanged for tokens.
#[async_trait]
pub trait AuthorizationRequestStorage: Send + Sync {
    /// Stores a new authorization request, keyed by its code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be stored (e.g., duplicate
    /// code, storage unavailable).
    async fn create(&self, request: &AuthorizationRequest) -> AuthResult<()>;

    /// Atomically removes and returns the request issued for `code`.
    ///
    /// Across any number of concurrent callers, at most one receives
    /// `Some` for a given code. Expired requests may still be returned;
    /// the engine checks expiry itself.
    ///
    /// # Returns
    ///
    /// Returns `None` if no request exists or it was already consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn consume(&self, code: &str) -> AuthResult<Option<AuthorizationRequest>>;
}
