//! In-memory client registry.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use octoid_auth::storage::ClientStorage;
use octoid_auth::{AuthResult, Client, ClientValidationError};

/// Client registry backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryClientStorage {
    clients: DashMap<String, Client>,
}

impl InMemoryClientStorage {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers `client`, replacing one with the same ID.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the registration is inconsistent.
    pub fn register(&self, client: Client) -> Result<(), ClientValidationError> {
        client.validate()?;
        debug!(client_id = %client.client_id, "Client registered");
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }

    /// Removes a client, returning it.
    pub fn remove(&self, client_id: &str) -> Option<Client> {
        self.clients.remove(client_id).map(|(_, client)| client)
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no client is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|entry| entry.value().clone()))
    }
}
