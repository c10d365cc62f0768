//! Client registration storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read access to registered OAuth clients.
///
/// Registered values are authoritative: the engine checks request values
/// for membership in what this store returns.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Finds a client by its client ID.
    ///
    /// # Returns
    ///
    /// Returns `Some(client)` if found, `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;
}
