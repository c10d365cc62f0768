//! In-memory collaborators for the octoid token exchange engine.
//!
//! This crate implements every storage trait of `octoid-auth` on top of
//! `dashmap` concurrent maps. Nothing is persisted; state lives as long as
//! the store value.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use octoid_auth::GrantDispatcher;
//! use octoid_auth_memory::MemoryStores;
//!
//! let stores = MemoryStores::new();
//! stores.clients.register(client)?;
//!
//! let dispatcher = stores.dispatcher_builder().build()?;
//! ```

pub mod authorization_request;
pub mod client;
pub mod device_code;
pub mod refresh_token;

use std::sync::Arc;

use octoid_auth::oauth::GrantDispatcherBuilder;
use octoid_auth::GrantDispatcher;

pub use authorization_request::InMemoryAuthorizationRequestStorage;
pub use client::InMemoryClientStorage;
pub use device_code::InMemoryDeviceCodeStorage;
pub use refresh_token::InMemoryRefreshTokenStorage;

/// One of each in-memory store, shareable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    /// Registered clients.
    pub clients: Arc<InMemoryClientStorage>,
    /// Pending authorization requests.
    pub authorization_requests: Arc<InMemoryAuthorizationRequestStorage>,
    /// Refresh token records.
    pub refresh_tokens: Arc<InMemoryRefreshTokenStorage>,
    /// Device authorizations.
    pub device_codes: Arc<InMemoryDeviceCodeStorage>,
}

impl MemoryStores {
    /// Creates empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher builder wired to every store.
    #[must_use]
    pub fn dispatcher_builder(&self) -> GrantDispatcherBuilder {
        GrantDispatcher::builder(self.clients.clone())
            .authorization_requests(self.authorization_requests.clone())
            .refresh_tokens(self.refresh_tokens.clone())
            .device_codes(self.device_codes.clone())
    }
}
