//! PKCE (Proof Key for Code Exchange) implementation
//!
//! Implements RFC 7636 with the S256 method only. Any other method value,
//! `plain` included, is rejected.
//!
//! # Example
//!
//! ```
//! use octoid_auth::oauth::pkce::{PkceChallenge, PkceVerifier, verify_code_verifier};
//!
//! // Client generates a verifier and challenge
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//!
//! // Server stores the challenge, later verifies with the verifier
//! assert!(verify_code_verifier(verifier.as_str(), challenge.as_str(), "S256").is_ok());
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PKCE verification.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Unsupported challenge method (only S256 is supported).
    #[error("Unsupported challenge method: '{0}'. Only S256 is supported.")]
    UnsupportedMethod(String),

    /// PKCE verification failed (verifier doesn't match challenge).
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        match err {
            PkceError::UnsupportedMethod(_) => AuthError::invalid_grant(err.to_string()),
            PkceError::VerificationFailed => AuthError::PkceVerificationFailed,
        }
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash (the only supported method).
    #[default]
    S256,
}

impl PkceChallengeMethod {
    /// Parse challenge method from string.
    ///
    /// The method token is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything but `S256`,
    /// including an empty value.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        if method.eq_ignore_ascii_case("S256") {
            Ok(Self::S256)
        } else {
            Err(PkceError::UnsupportedMethod(method.to_string()))
        }
    }

    /// Get the method as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Computes the S256 challenge of a verifier:
/// `BASE64URL-NOPAD(SHA256(ASCII(code_verifier)))`.
#[must_use]
pub fn s256_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Verifies a `code_verifier` against a stored challenge and method.
///
/// The challenge comparison is case-sensitive and constant-time.
///
/// # Errors
///
/// - `PkceError::UnsupportedMethod` if `method` is not S256
/// - `PkceError::VerificationFailed` if the digest does not match
pub fn verify_code_verifier(
    code_verifier: &str,
    code_challenge: &str,
    method: &str,
) -> Result<(), PkceError> {
    match PkceChallengeMethod::parse(method)? {
        PkceChallengeMethod::S256 => {
            let computed = s256_challenge(code_verifier);
            if bool::from(computed.as_bytes().ct_eq(code_challenge.as_bytes())) {
                Ok(())
            } else {
                Err(PkceError::VerificationFailed)
            }
        }
    }
}

// =============================================================================
// Client-side helpers
// =============================================================================

/// PKCE code verifier, as generated by a relying party.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a cryptographically random verifier.
    ///
    /// Generates 32 random bytes and encodes them as base64url (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        // `gen` is a reserved keyword in Rust 2024
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// PKCE S256 code challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Create a challenge from a verifier using the S256 method.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self(s256_challenge(verifier.as_str()))
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the challenge and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

// =============================================================================
// Tests
// =============================================================================
