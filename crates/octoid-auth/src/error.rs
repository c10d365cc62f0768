//! Diagnostic error types for the token exchange engine.
//!
//! [`AuthError`] describes *why* an exchange failed. It is what collaborators
//! (storage backends, token generators) return and what gets logged. It may
//! contain internal identifiers and is never sent to the caller as-is; the
//! protocol-level error that crosses the trust boundary is
//! [`TokenError`](crate::oauth::TokenError), derived from it by
//! [`TokenError::from_auth_error`](crate::oauth::TokenError::from_auth_error).

use std::fmt;

/// Errors that can occur while adjudicating a token request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client is unknown or could not be identified.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization grant or refresh token is invalid, expired, revoked
    /// or was issued to another client.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// PKCE code verifier does not match the stored code challenge.
    #[error("PKCE verification failed")]
    PkceVerificationFailed,

    /// The requested scope is invalid or exceeds what was granted.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// The request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The grant type is unknown, not served, or not declared by the client.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The device authorization is still waiting for the user.
    #[error("Authorization pending")]
    AuthorizationPending,

    /// The client polls the device endpoint too fast.
    #[error("Slow down")]
    SlowDown,

    /// The resource owner denied the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of why access was denied.
        message: String,
    },

    /// The device code has expired.
    #[error("Expired token")]
    ExpiredToken,

    /// A storage collaborator failed for a reason other than not-found.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// A collaborator did not answer before the configured deadline.
    #[error("Deadline exceeded while {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// The token generator failed.
    #[error("Token generation failed: {message}")]
    TokenGeneration {
        /// Description of the generator error.
        message: String,
    },

    /// The engine configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The caller handed the engine something it cannot process.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates a new `TokenGeneration` error.
    #[must_use]
    pub fn token_generation(message: impl Into<String>) -> Self {
        Self::TokenGeneration {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller is at fault (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if the server is at fault (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::Timeout { .. }
                | Self::TokenGeneration { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClient { .. } => ErrorCategory::Authentication,
            Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::PkceVerificationFailed => ErrorCategory::Authentication,
            Self::InvalidScope { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::UnsupportedGrantType { .. } => ErrorCategory::Validation,
            Self::AuthorizationPending => ErrorCategory::Pending,
            Self::SlowDown => ErrorCategory::Pending,
            Self::AccessDenied { .. } => ErrorCategory::Authorization,
            Self::ExpiredToken => ErrorCategory::Authentication,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Timeout { .. } => ErrorCategory::Infrastructure,
            Self::TokenGeneration { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::PkceVerificationFailed => "invalid_grant",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::AuthorizationPending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::AccessDenied { .. } => "access_denied",
            Self::ExpiredToken => "expired_token",
            Self::Storage { .. }
            | Self::Timeout { .. }
            | Self::TokenGeneration { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of exchange errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client or grant could not be authenticated.
    Authentication,
    /// Permission or scope problems.
    Authorization,
    /// Request validation errors.
    Validation,
    /// Device flow not finished yet.
    Pending,
    /// Storage, deadline or generator failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Validation => write!(f, "validation"),
            Self::Pending => write!(f, "pending"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
