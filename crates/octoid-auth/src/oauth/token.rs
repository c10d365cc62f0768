//! Token endpoint request and response types.
//!
//! # Supported Grant Types
//!
//! - `authorization_code` - Exchange authorization code for tokens
//! - `client_credentials` - Machine-to-machine access
//! - `refresh_token` - Refresh an access token
//! - `urn:ietf:params:oauth:grant-type:device_code` - Device flow polling
//!
//! Any other `grant_type` value deserializes to [`GrantRequest::Unsupported`]
//! so the dispatcher can answer `unsupported_grant_type` instead of the
//! transport failing to parse.

use serde::{Deserialize, Serialize};

use crate::oauth::error::TokenError;
use crate::types::GrantType;

/// Token request parameters.
///
/// Carries exactly one grant payload, discriminated by `grant_type`.
///
/// ```
/// use octoid_auth::oauth::{GrantRequest, TokenRequest};
///
/// let request: TokenRequest = serde_json::from_str(r#"{
///     "grant_type": "authorization_code",
///     "client_id": "my-app",
///     "code": "SplxlOBeZQQYbYS6WxSbIA",
///     "code_verifier": "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
///     "redirect_uri": "https://app.example.com/callback"
/// }"#).unwrap();
///
/// assert!(matches!(request.grant, GrantRequest::AuthorizationCode { .. }));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Client ID of the caller.
    #[serde(default)]
    pub client_id: String,

    /// Grant-specific payload.
    #[serde(flatten)]
    pub grant: GrantRequest,
}

impl TokenRequest {
    /// Creates a request for `client_id` with the given payload.
    #[must_use]
    pub fn new(client_id: impl Into<String>, grant: GrantRequest) -> Self {
        Self {
            client_id: client_id.into(),
            grant,
        }
    }

    /// The grant type of the payload, `None` if unsupported.
    #[must_use]
    pub fn grant_type(&self) -> Option<GrantType> {
        self.grant.grant_type()
    }
}

/// Grant payloads, tagged by `grant_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant_type")]
pub enum GrantRequest {
    /// RFC 6749 §4.1.3.
    #[serde(rename = "authorization_code")]
    AuthorizationCode {
        /// Authorization code.
        #[serde(default)]
        code: String,
        /// PKCE code verifier.
        #[serde(default)]
        code_verifier: String,
        /// Redirect URI (must match authorization request).
        #[serde(default)]
        redirect_uri: String,
    },

    /// RFC 6749 §4.4.2.
    #[serde(rename = "client_credentials")]
    ClientCredentials {
        /// Requested scope.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },

    /// RFC 6749 §6.
    #[serde(rename = "refresh_token")]
    RefreshToken {
        /// The refresh token.
        #[serde(default)]
        refresh_token: String,
        /// Requested scope (must be a subset of the original grant).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },

    /// RFC 8628 §3.4.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:device_code")]
    DeviceCode {
        /// Device verification code.
        #[serde(default)]
        device_code: String,
    },

    /// Any grant type this engine does not know.
    #[serde(other)]
    Unsupported,
}

impl GrantRequest {
    /// Builds an authorization_code payload.
    #[must_use]
    pub fn authorization_code(
        code: impl Into<String>,
        code_verifier: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::AuthorizationCode {
            code: code.into(),
            code_verifier: code_verifier.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// The grant type of the payload, `None` if unsupported.
    #[must_use]
    pub fn grant_type(&self) -> Option<GrantType> {
        match self {
            Self::AuthorizationCode { .. } => Some(GrantType::AuthorizationCode),
            Self::ClientCredentials { .. } => Some(GrantType::ClientCredentials),
            Self::RefreshToken { .. } => Some(GrantType::RefreshToken),
            Self::DeviceCode { .. } => Some(GrantType::DeviceCode),
            Self::Unsupported => None,
        }
    }
}

/// Issued token set.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "refresh_token": "abc123...",
///   "scope": "openid offline_access"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenIdToken {
    /// The access token.
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Refresh token (only when `offline_access` was granted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Granted scopes (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl OpenIdToken {
    /// Creates a bearer token set with required fields.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            id_token: None,
            scope: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: String) -> Self {
        self.refresh_token = Some(token);
        self
    }

    /// Sets the ID token.
    #[must_use]
    pub fn with_id_token(mut self, token: String) -> Self {
        self.id_token = Some(token);
        self
    }

    /// Sets the granted scope.
    #[must_use]
    pub fn with_scope(mut self, scope: String) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Result of a token exchange.
///
/// Holds either an error or an optional token set, never both. A success
/// without a token set is well-formed: it is what a grant whose scope
/// entitles the caller to nothing produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    error: Option<TokenError>,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    openid: Option<OpenIdToken>,
}

impl TokenResponse {
    /// A successful response carrying `token`.
    #[must_use]
    pub fn issued(token: OpenIdToken) -> Self {
        Self {
            error: None,
            openid: Some(token),
        }
    }

    /// A successful response without a token set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            error: None,
            openid: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failed(error: TokenError) -> Self {
        Self {
            error: Some(error),
            openid: None,
        }
    }

    /// Returns `true` if this response carries an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&TokenError> {
        self.error.as_ref()
    }

    /// The issued token set, if any.
    #[must_use]
    pub fn openid(&self) -> Option<&OpenIdToken> {
        self.openid.as_ref()
    }

    /// Consumes the response, returning the token set.
    #[must_use]
    pub fn into_openid(self) -> Option<OpenIdToken> {
        self.openid
    }

    /// HTTP status code the transport should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.error.as_ref().map_or(200, TokenError::http_status)
    }
}

impl From<TokenError> for TokenResponse {
    fn from(error: TokenError) -> Self {
        Self::failed(error)
    }
}

impl From<crate::oauth::error::ExchangeError> for TokenResponse {
    fn from(err: crate::oauth::error::ExchangeError) -> Self {
        Self::failed(err.into_token_error())
    }
}
