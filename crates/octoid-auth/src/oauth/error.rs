//! Protocol-level token errors.
//!
//! A [`TokenError`] is the only failure value that crosses the trust
//! boundary. It carries an RFC 6749 §5.2 error code and, once a grant has
//! been resolved, the `state` the client supplied at authorization time.
//! Diagnostic detail stays in the [`AuthError`] wrapped by [`ExchangeError`].
//!
//! # Example Response
//!
//! ```json
//! {
//!   "error": "invalid_grant",
//!   "state": "af0ifjsldkj"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;

/// OAuth 2.0 token error codes.
///
/// Defined in RFC 6749 Section 5.2, plus the device flow codes of
/// RFC 8628 Section 3.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    /// The request is missing a required parameter or is otherwise malformed.
    InvalidRequest,

    /// Client identification failed.
    InvalidClient,

    /// The provided authorization grant or refresh token is invalid, expired,
    /// revoked, or was issued to another client.
    InvalidGrant,

    /// The client is not authorized to use this authorization grant type.
    UnauthorizedClient,

    /// The authorization grant type is not supported.
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, or exceeds the granted scope.
    InvalidScope,

    /// The server failed to process the request.
    ServerError,

    /// The device authorization is still pending.
    AuthorizationPending,

    /// The client is polling too fast.
    SlowDown,

    /// The resource owner denied the request.
    AccessDenied,

    /// The device code expired.
    ExpiredToken,
}

impl TokenErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::AuthorizationPending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::AccessDenied => "access_denied",
            Self::ExpiredToken => "expired_token",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::ServerError => 500,
            Self::InvalidRequest
            | Self::InvalidGrant
            | Self::UnauthorizedClient
            | Self::UnsupportedGrantType
            | Self::InvalidScope
            | Self::AuthorizationPending
            | Self::SlowDown
            | Self::AccessDenied
            | Self::ExpiredToken => 400,
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&AuthError> for TokenErrorCode {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidClient { .. } => Self::InvalidClient,
            AuthError::InvalidGrant { .. } | AuthError::PkceVerificationFailed => {
                Self::InvalidGrant
            }
            AuthError::InvalidScope { .. } => Self::InvalidScope,
            AuthError::InvalidRequest { .. } => Self::InvalidRequest,
            AuthError::UnsupportedGrantType { .. } => Self::UnsupportedGrantType,
            AuthError::AuthorizationPending => Self::AuthorizationPending,
            AuthError::SlowDown => Self::SlowDown,
            AuthError::AccessDenied { .. } => Self::AccessDenied,
            AuthError::ExpiredToken => Self::ExpiredToken,
            AuthError::Storage { .. }
            | AuthError::Timeout { .. }
            | AuthError::TokenGeneration { .. }
            | AuthError::Configuration { .. }
            | AuthError::Internal { .. } => Self::ServerError,
        }
    }
}

/// Token error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: TokenErrorCode,

    /// Client state from the resolved authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl TokenError {
    /// Creates a new token error without state.
    #[must_use]
    pub fn new(error: TokenErrorCode) -> Self {
        Self { error, state: None }
    }

    /// Creates a token error echoing `state`.
    ///
    /// An empty state is dropped.
    #[must_use]
    pub fn with_state(error: TokenErrorCode, state: Option<&str>) -> Self {
        Self {
            error,
            state: state.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Maps a diagnostic to its protocol error.
    ///
    /// Pass `state` only once the grant has been resolved.
    #[must_use]
    pub fn from_auth_error(err: &AuthError, state: Option<&str>) -> Self {
        Self::with_state(TokenErrorCode::from(err), state)
    }

    /// Creates an invalid_grant error.
    #[must_use]
    pub fn invalid_grant() -> Self {
        Self::new(TokenErrorCode::InvalidGrant)
    }

    /// Creates an unsupported_grant_type error.
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(TokenErrorCode::UnsupportedGrantType)
    }

    /// Creates a server_error error.
    #[must_use]
    pub fn server_error() -> Self {
        Self::new(TokenErrorCode::ServerError)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.error.http_status()
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// A failed exchange.
///
/// Pairs the protocol error returned to the caller with the diagnostic that
/// produced it. Only [`error`](Self::error) may be serialized.
#[derive(Debug, thiserror::Error)]
#[error("{error}: {source}")]
pub struct ExchangeError {
    error: TokenError,
    source: AuthError,
}

impl ExchangeError {
    /// Wraps a diagnostic, echoing `state` if one was resolved.
    #[must_use]
    pub fn new(source: AuthError, state: Option<&str>) -> Self {
        Self {
            error: TokenError::from_auth_error(&source, state),
            source,
        }
    }

    /// The protocol error.
    #[must_use]
    pub fn error(&self) -> &TokenError {
        &self.error
    }

    /// The diagnostic.
    #[must_use]
    pub fn diagnostic(&self) -> &AuthError {
        &self.source
    }

    /// Consumes the error, returning the protocol part.
    #[must_use]
    pub fn into_token_error(self) -> TokenError {
        self.error
    }
}

impl From<AuthError> for ExchangeError {
    fn from(source: AuthError) -> Self {
        Self::new(source, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&TokenErrorCode::UnsupportedGrantType).unwrap();
        assert_eq!(json, r#""unsupported_grant_type""#);
        assert_eq!(TokenErrorCode::ExpiredToken.to_string(), "expired_token");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TokenErrorCode::InvalidClient.http_status(), 401);
        assert_eq!(TokenErrorCode::ServerError.http_status(), 500);
        assert_eq!(TokenErrorCode::InvalidGrant.http_status(), 400);
        assert_eq!(TokenErrorCode::SlowDown.http_status(), 400);
    }

    #[test]
    fn test_state_echo_only_when_non_empty() {
        let err = TokenError::from_auth_error(&AuthError::invalid_grant("x"), Some("xyz"));
        assert_eq!(err.state.as_deref(), Some("xyz"));

        let err = TokenError::from_auth_error(&AuthError::invalid_grant("x"), Some(""));
        assert!(err.state.is_none());

        let err = TokenError::from_auth_error(&AuthError::invalid_grant("x"), None);
        assert!(err.state.is_none());
    }

    #[test]
    fn test_serialized_error_omits_missing_state() {
        let json = serde_json::to_value(TokenError::invalid_grant()).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "invalid_grant" }));

        let err = TokenError::with_state(TokenErrorCode::InvalidGrant, Some("abc"));
        let json = serde_json::to_value(err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "invalid_grant", "state": "abc" })
        );
    }

    #[test]
    fn test_server_faults_collapse_to_server_error() {
        for err in [
            AuthError::storage("db"),
            AuthError::timeout("consuming authorization request"),
            AuthError::token_generation("rng"),
            AuthError::internal("payload mismatch"),
        ] {
            assert_eq!(TokenErrorCode::from(&err), TokenErrorCode::ServerError);
        }
    }

    #[test]
    fn test_exchange_error_keeps_diagnostic_private() {
        let err = ExchangeError::new(AuthError::storage("connection refused to 10.0.0.5"), Some("s"));
        assert_eq!(err.error().error, TokenErrorCode::ServerError);
        assert!(matches!(err.diagnostic(), AuthError::Storage { .. }));

        let json = serde_json::to_string(err.error()).unwrap();
        assert!(!json.contains("10.0.0.5"));
    }
}
