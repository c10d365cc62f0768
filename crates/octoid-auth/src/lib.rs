//! # octoid-auth
//!
//! OAuth 2.0 / OpenID Connect token exchange engine.
//!
//! This crate validates token requests against a client's registered
//! capabilities and a previously issued grant, then mints access, refresh
//! and ID tokens. It provides:
//! - Grant dispatch with a pluggable handler registry
//! - The authorization code grant with mandatory PKCE (S256)
//! - Client credentials, refresh token and device code grants
//! - RFC 6749 error responses that never leak diagnostics
//!
//! ## Overview
//!
//! Transport, persistence and client provisioning stay outside. The engine
//! talks to them through the traits in [`storage`] and [`token`], every call
//! bounded by the configured collaborator timeout.
//!
//! ## Modules
//!
//! - [`config`] - Engine configuration and layered loading
//! - [`error`] - Diagnostic errors
//! - [`oauth`] - Dispatcher, grant handlers, PKCE, scope policy
//! - [`observability`] - Tracing subscriber setup
//! - [`storage`] - Storage traits for clients and grants
//! - [`token`] - Token value generation (opaque, JWT)
//! - [`types`] - Clients, scopes and stored grant records

pub mod config;
pub mod error;
pub mod oauth;
pub mod observability;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    ExchangeError, GrantDispatcher, GrantHandler, GrantRequest, OpenIdToken, TokenError,
    TokenErrorCode, TokenRequest, TokenResponse,
};
pub use storage::{
    AuthorizationRequestStorage, ClientStorage, DeviceCodeStorage, RefreshTokenStorage,
};
pub use token::{TokenContext, TokenGenerator, TokenKind};
pub use types::{Client, ClientValidationError, GrantType, Scopes};

/// Type alias for token exchange results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```
/// use octoid_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::oauth::{
        AuthorizationRequest, ExchangeError, GrantDispatcher, GrantHandler, GrantRequest,
        OpenIdToken, TokenError, TokenErrorCode, TokenRequest, TokenResponse,
    };
    pub use crate::storage::{
        AuthorizationRequestStorage, ClientStorage, DeviceCodeStorage, RefreshTokenStorage,
    };
    pub use crate::token::{
        JwtTokenGenerator, OpaqueTokenGenerator, TokenContext, TokenGenerator, TokenKind,
    };
    pub use crate::types::{
        Client, DeviceAuthorization, DeviceAuthorizationStatus, GrantType, RefreshTokenRecord,
        Scopes,
    };
}
