//! Token value generation.
//!
//! The engine decides *which* tokens to issue; a [`TokenGenerator`] decides
//! what their values look like. Two implementations ship:
//!
//! - [`OpaqueTokenGenerator`] - 256 random bits, base64url
//! - [`JwtTokenGenerator`](super::jwt::JwtTokenGenerator) - HMAC-signed JWTs

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::AuthResult;

/// The kind of token being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Access token.
    Access,
    /// Refresh token.
    Refresh,
    /// OpenID Connect ID token.
    Id,
}

impl TokenKind {
    /// Returns the kind as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
            Self::Id => "id_token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a generator may bind into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
    /// Which token is requested.
    pub kind: TokenKind,
    /// Client the token is issued to.
    pub client_id: String,
    /// Subject the token represents. For client_credentials this is the
    /// client itself.
    pub subject: String,
    /// Granted scopes (space-separated).
    pub scope: String,
    /// Validity period.
    pub lifetime: Duration,
    /// OpenID Connect nonce, for ID tokens.
    pub nonce: Option<String>,
}

impl TokenContext {
    /// Creates a context.
    #[must_use]
    pub fn new(
        kind: TokenKind,
        client_id: impl Into<String>,
        subject: impl Into<String>,
        scope: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        Self {
            kind,
            client_id: client_id.into(),
            subject: subject.into(),
            scope: scope.into(),
            lifetime,
            nonce: None,
        }
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: Option<String>) -> Self {
        self.nonce = nonce;
        self
    }
}

/// Produces token values.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    /// Generates a token value for `context`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenGeneration` if no value can be produced.
    async fn generate(&self, context: &TokenContext) -> AuthResult<String>;
}

/// Generates opaque random tokens.
///
/// Values carry no information; a resource server must introspect them.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenGenerator;

impl OpaqueTokenGenerator {
    /// Creates a new opaque generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenGenerator for OpaqueTokenGenerator {
    async fn generate(&self, _context: &TokenContext) -> AuthResult<String> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    fn context(kind: TokenKind) -> TokenContext {
        TokenContext::new(kind, "app", "alice", "openid", Duration::from_secs(3600))
    }

    #[test]
    fn test_opaque_tokens_are_random() {
        let generator = OpaqueTokenGenerator::new();
        let a = block_on(generator.generate(&context(TokenKind::Access))).unwrap();
        let b = block_on(generator.generate(&context(TokenKind::Access))).unwrap();

        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(!a.contains('='));
    }

    #[test]
    fn test_token_kind_display() {
        assert_eq!(TokenKind::Refresh.to_string(), "refresh_token");
        assert_eq!(TokenKind::Id.as_str(), "id_token");
    }
}
