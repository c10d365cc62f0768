//! Common types used across the token exchange engine.
//!
//! ## Domain Types
//!
//! - [`Client`] - OAuth 2.0 client registration
//! - [`GrantType`] - Grant types the engine can dispatch
//! - [`Scopes`] - Parsed scope set
//! - [`RefreshTokenRecord`] - Stored refresh token metadata
//! - [`DeviceAuthorization`] - Pending device authorization (RFC 8628)

pub mod client;
pub mod device_code;
pub mod refresh_token;
pub mod scope;

pub use client::{Client, ClientValidationError, GrantType};
pub use device_code::{DeviceAuthorization, DeviceAuthorizationStatus};
pub use refresh_token::RefreshTokenRecord;
pub use scope::{OFFLINE_ACCESS, OPENID, Scopes};
