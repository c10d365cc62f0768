//! Authorization requests redeemed at the token endpoint.
//!
//! An [`AuthorizationRequest`] is created by the authorization endpoint when
//! it issues a code. The token exchange engine never builds one; it only
//! obtains one by code from an
//! [`AuthorizationRequestStorage`](crate::storage::AuthorizationRequestStorage).
//!
//! # Lifecycle
//!
//! 1. Created when the authorization request is approved
//! 2. Authorization code is issued to the client
//! 3. Client exchanges the code (request consumed by the store)
//! 4. Store drops expired requests

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::types::Scopes;

/// Server-side record of an approved authorization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Authorization code (one-time use).
    pub code: String,

    /// Client identifier that initiated the request.
    pub client_id: String,

    /// Subject (end-user) that approved the request.
    pub subject: String,

    /// Requested scopes (space-separated).
    pub scope: String,

    /// Redirect URI from the authorization request.
    /// Must match the redirect_uri in the token request.
    pub redirect_uri: String,

    /// PKCE code challenge from the authorization request.
    pub code_challenge: String,

    /// PKCE challenge method (expected "S256").
    pub code_challenge_method: String,

    /// State parameter from the authorization request.
    /// Echoed on token errors once the request is resolved.
    #[serde(default)]
    pub state: String,

    /// OpenID Connect nonce for ID token binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Timestamp when the request was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Timestamp when the code expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl AuthorizationRequest {
    /// Default authorization code lifetime.
    pub const DEFAULT_LIFETIME: Duration = Duration::minutes(10);

    /// Creates a request with a freshly generated code, valid for
    /// [`DEFAULT_LIFETIME`](Self::DEFAULT_LIFETIME).
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        subject: impl Into<String>,
        scope: impl Into<String>,
        redirect_uri: impl Into<String>,
        code_challenge: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            code: Self::generate_code(),
            client_id: client_id.into(),
            subject: subject.into(),
            scope: scope.into(),
            redirect_uri: redirect_uri.into(),
            code_challenge: code_challenge.into(),
            code_challenge_method: "S256".to_string(),
            state: String::new(),
            nonce: None,
            created_at: now,
            expires_at: now + Self::DEFAULT_LIFETIME,
        }
    }

    /// Replaces the generated code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the echoed `state` value.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Sets the PKCE challenge method.
    #[must_use]
    pub fn with_challenge_method(mut self, method: impl Into<String>) -> Self {
        self.code_challenge_method = method.into();
        self
    }

    /// Sets the OpenID Connect nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the expiration instant.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Generates a new authorization code: 256 random bits, base64url
    /// without padding (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Parsed granted scopes.
    #[must_use]
    pub fn scopes(&self) -> Scopes {
        Scopes::parse(&self.scope)
    }

    /// Returns `true` if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}
