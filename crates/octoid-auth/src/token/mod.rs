//! Token value generation.
//!
//! This module provides:
//!
//! - The [`TokenGenerator`] collaborator contract
//! - Opaque random tokens
//! - HMAC-signed JWT tokens

pub mod generator;
pub mod jwt;

use std::sync::Arc;

pub use generator::{OpaqueTokenGenerator, TokenContext, TokenGenerator, TokenKind};
pub use jwt::{JwtError, JwtTokenGenerator, SigningAlgorithm, TokenClaims};

use crate::config::{AuthConfig, ConfigError, TokenFormat};

/// Builds the generator selected by `signing.format`.
///
/// # Errors
///
/// Returns a `ConfigError` if the JWT signing configuration is invalid.
pub fn generator_from_config(config: &AuthConfig) -> Result<Arc<dyn TokenGenerator>, ConfigError> {
    Ok(match config.signing.format {
        TokenFormat::Opaque => Arc::new(OpaqueTokenGenerator::new()),
        TokenFormat::Jwt => Arc::new(JwtTokenGenerator::from_config(config)?),
    })
}
