//! JWT token generation and validation.
//!
//! Tokens are signed with a shared HMAC secret. Supported algorithms:
//!
//! - **HS256**: HMAC with SHA-256
//! - **HS384**: HMAC with SHA-384
//! - **HS512**: HMAC with SHA-512
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use octoid_auth::token::{JwtTokenGenerator, SigningAlgorithm, TokenClaims};
//!
//! let generator = JwtTokenGenerator::new(
//!     b"0123456789abcdef0123456789abcdef",
//!     SigningAlgorithm::HS256,
//!     "https://auth.example.com",
//! );
//! let claims = TokenClaims::new("https://auth.example.com", "alice", "app", Duration::from_secs(60));
//! let token = generator.encode(&claims).unwrap();
//! assert_eq!(generator.decode(&token).unwrap().sub, "alice");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::{AuthConfig, ConfigError, MIN_SECRET_LEN};
use crate::error::AuthError;
use crate::token::generator::{TokenContext, TokenGenerator, TokenKind};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::token_generation(err.to_string())
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for JWT tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be HS256, HS384, or HS512",
                other
            ))),
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Claims carried by every generated JWT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject (user, or the client for client_credentials).
    pub sub: String,

    /// Audience (the client ID).
    pub aud: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// JWT ID.
    pub jti: String,

    /// OAuth client ID.
    pub client_id: String,

    /// Space-separated scopes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,

    /// Which token this is: `access_token`, `refresh_token` or `id_token`.
    pub token_use: String,

    /// Nonce from the authorization request (ID tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl TokenClaims {
    /// Creates access token claims valid for `lifetime` from now.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        client_id: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let client_id = client_id.into();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: client_id.clone(),
            exp: now.saturating_add(lifetime),
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            client_id,
            scope: String::new(),
            token_use: TokenKind::Access.as_str().to_string(),
            nonce: None,
        }
    }

    /// Builds claims from a generation context.
    #[must_use]
    pub fn from_context(issuer: &str, context: &TokenContext) -> Self {
        let mut claims = Self::new(
            issuer,
            &context.subject,
            &context.client_id,
            context.lifetime,
        );
        claims.scope = context.scope.clone();
        claims.token_use = context.kind.as_str().to_string();
        claims.nonce = context.nonce.clone();
        claims
    }
}

// ============================================================================
// JWT Generator
// ============================================================================

/// Generates HMAC-signed JWT tokens.
///
/// This generator is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
pub struct JwtTokenGenerator {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtTokenGenerator {
    /// Creates a new JWT generator.
    ///
    /// # Arguments
    /// * `secret` - The shared HMAC secret
    /// * `algorithm` - The signing algorithm
    /// * `issuer` - The issuer claim value
    #[must_use]
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm, issuer: impl Into<String>) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    /// Creates a generator from the signing configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the algorithm is unsupported or the secret
    /// is missing or too short.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let algorithm = SigningAlgorithm::from_str(&config.signing.algorithm)?;
        let secret = config
            .signing
            .secret
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("signing.secret".to_string()))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "signing.secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self::new(secret.as_bytes(), algorithm, &config.issuer))
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm.to_jwt_algorithm());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a JWT string.
    ///
    /// # Errors
    /// Returns an error if decoding or validation fails.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false; // Audience is the client; checked by the resource server

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl fmt::Debug for JwtTokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenGenerator")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenGenerator for JwtTokenGenerator {
    async fn generate(&self, context: &TokenContext) -> AuthResult<String> {
        let claims = TokenClaims::from_context(&self.issuer, context);
        Ok(self.encode(&claims)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const ISSUER: &str = "https://auth.example.com";

    fn generator(algorithm: SigningAlgorithm) -> JwtTokenGenerator {
        JwtTokenGenerator::new(SECRET, algorithm, ISSUER)
    }

    #[test]
    fn test_encode_decode_all_algorithms() {
        for algorithm in [
            SigningAlgorithm::HS256,
            SigningAlgorithm::HS384,
            SigningAlgorithm::HS512,
        ] {
            let generator = generator(algorithm);
            let claims = TokenClaims::new(ISSUER, "user123", "client456", Duration::from_secs(3600));

            let token = generator.encode(&claims).unwrap();
            let decoded = generator.decode(&token).unwrap();
            assert_eq!(decoded.sub, "user123");
            assert_eq!(decoded.client_id, "client456");
            assert_eq!(decoded.aud, "client456");
        }
    }

    #[tokio::test]
    async fn test_generate_binds_context() {
        let generator = generator(SigningAlgorithm::HS256);
        let context = TokenContext::new(
            TokenKind::Id,
            "app",
            "alice",
            "openid",
            Duration::from_secs(600),
        )
        .with_nonce(Some("n-0S6".to_string()));

        let token = generator.generate(&context).await.unwrap();
        let claims = generator.decode(&token).unwrap();

        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_use, "id_token");
        assert_eq!(claims.scope, "openid");
        assert_eq!(claims.nonce.as_deref(), Some("n-0S6"));
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[tokio::test]
    async fn test_generated_tokens_are_unique() {
        let generator = generator(SigningAlgorithm::HS256);
        let context =
            TokenContext::new(TokenKind::Access, "app", "alice", "openid", Duration::from_secs(60));
        let a = generator.generate(&context).await.unwrap();
        let b = generator.generate(&context).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let generator = generator(SigningAlgorithm::HS256);
        let mut claims = TokenClaims::new(ISSUER, "user123", "client456", Duration::from_secs(0));
        claims.exp -= 3600;

        let token = generator.encode(&claims).unwrap();
        assert!(matches!(generator.decode(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let generator1 = generator(SigningAlgorithm::HS256);
        let generator2 =
            JwtTokenGenerator::new(b"another-secret-another-secret-xx", SigningAlgorithm::HS256, ISSUER);

        let claims = TokenClaims::new(ISSUER, "user123", "client456", Duration::from_secs(60));
        let token = generator1.encode(&claims).unwrap();

        assert!(matches!(
            generator2.decode(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = AuthConfig::default();
        assert!(matches!(
            JwtTokenGenerator::from_config(&config),
            Err(ConfigError::Missing(_))
        ));

        config.signing.secret = Some(String::from_utf8(SECRET.to_vec()).unwrap());
        config.signing.algorithm = "HS512".to_string();
        let generator = JwtTokenGenerator::from_config(&config).unwrap();
        assert_eq!(generator.algorithm(), SigningAlgorithm::HS512);
        assert_eq!(generator.issuer(), "http://localhost:8080");

        config.signing.algorithm = "RS256".to_string();
        assert!(JwtTokenGenerator::from_config(&config).is_err());
    }

    #[test]
    fn test_jwt_error_maps_to_server_error() {
        let err: AuthError = JwtError::encoding_error("bad key").into();
        assert!(err.is_server_error());
    }
}
