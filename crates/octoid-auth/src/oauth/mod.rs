//! OAuth 2.0 token exchange.
//!
//! This module provides the token endpoint core:
//!
//! - [`dispatcher`] - Grant dispatch and handler registry
//! - [`grant`] - Grant handlers (authorization code, client credentials,
//!   refresh token, device code)
//! - [`pkce`] - PKCE challenge/verifier implementation
//! - [`scope_policy`] - Which tokens a granted scope entitles to
//! - [`session`] - Authorization requests redeemed by code
//! - [`token`] - Token request and response types
//! - [`error`] - Protocol error codes
//!
//! # Authorization Code Flow
//!
//! ```ignore
//! use octoid_auth::oauth::{GrantDispatcher, GrantRequest, TokenRequest};
//!
//! let dispatcher = GrantDispatcher::builder(clients)
//!     .authorization_requests(requests)
//!     .build()?;
//!
//! let request = TokenRequest::new(
//!     "my-app",
//!     GrantRequest::authorization_code(code, verifier, "https://app.example.com/callback"),
//! );
//! let response = dispatcher.respond(&request).await;
//! ```

pub mod dispatcher;
pub mod error;
pub mod grant;
pub mod pkce;
pub mod scope_policy;
pub mod session;
pub mod token;

pub use dispatcher::{GrantDispatcher, GrantDispatcherBuilder};
pub use error::{ExchangeError, TokenError, TokenErrorCode};
pub use grant::{
    AuthorizationCodeGrant, ClientCredentialsGrant, DeviceCodeGrant, GrantHandler, Grantee,
    RefreshTokenGrant, TokenIssuer,
};
pub use pkce::{
    PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier, s256_challenge,
    verify_code_verifier,
};
pub use scope_policy::{IssuancePlan, ScopePolicy};
pub use session::AuthorizationRequest;
pub use token::{GrantRequest, OpenIdToken, TokenRequest, TokenResponse};
