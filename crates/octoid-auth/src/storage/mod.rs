//! Storage traits consulted by the token exchange engine.
//!
//! This module defines storage interfaces for:
//!
//! - OAuth client registrations
//! - Authorization requests (redeemed by code)
//! - Refresh token metadata
//! - Device authorizations
//!
//! The engine only reads through these traits. The write operations exist
//! for the endpoints that produce the records.
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `octoid-auth-memory` - In-memory backend

pub mod authorization_request;
pub mod client;
pub mod device_code;
pub mod refresh_token;

pub use authorization_request::AuthorizationRequestStorage;
pub use client::ClientStorage;
pub use device_code::DeviceCodeStorage;
pub use refresh_token::RefreshTokenStorage;
