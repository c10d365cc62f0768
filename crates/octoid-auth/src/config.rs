//! Token exchange engine configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! issuer = "https://auth.example.com"
//!
//! [oauth]
//! access_token_lifetime = "1h"
//! collaborator_timeout = "5s"
//! issue_id_token = true
//! grant_types = ["authorization_code", "refresh_token"]
//!
//! [signing]
//! format = "jwt"
//! algorithm = "HS256"
//! secret = "change-me-change-me-change-me-32b"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::types::GrantType;

/// Minimum HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL (used in the `iss` claim of JWT tokens).
    pub issuer: String,

    /// OAuth 2.0 configuration.
    pub oauth: OAuthConfig,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            oauth: OAuthConfig::default(),
            signing: SigningConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// OAuth 2.0 configuration.
///
/// Controls token lifetimes, collaborator deadlines and the grant types the
/// engine serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Access token lifetime, reported as `expires_in`.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime (handed to the token generator).
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// ID token lifetime.
    #[serde(with = "humantime_serde")]
    pub id_token_lifetime: Duration,

    /// Deadline for every storage or generator call made during an exchange.
    #[serde(with = "humantime_serde")]
    pub collaborator_timeout: Duration,

    /// Issue an ID token alongside the access token for `openid` grants.
    pub issue_id_token: bool,

    /// Grant types served by the engine.
    pub grant_types: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600), // 1 hour
            refresh_token_lifetime: Duration::from_secs(90 * 24 * 3600), // 90 days
            id_token_lifetime: Duration::from_secs(3600),
            collaborator_timeout: Duration::from_secs(5),
            issue_id_token: false,
            grant_types: GrantType::ALL.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl OAuthConfig {
    /// Parses [`grant_types`](Self::grant_types).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown grant type.
    pub fn enabled_grant_types(&self) -> Result<Vec<GrantType>, ConfigError> {
        self.grant_types
            .iter()
            .map(|g| {
                GrantType::from_str(g).map_err(|_| {
                    ConfigError::InvalidValue(format!("Invalid grant type: '{}'", g))
                })
            })
            .collect()
    }
}

/// Token value format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// Random opaque strings.
    #[default]
    Opaque,
    /// HMAC-signed JWTs.
    Jwt,
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Token value format.
    pub format: TokenFormat,

    /// JWT signing algorithm: HS256, HS384 or HS512.
    pub algorithm: String,

    /// HMAC secret. Required for the `jwt` format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            format: TokenFormat::Opaque,
            algorithm: "HS256".to_string(),
            secret: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer URL is empty
    /// - A token lifetime is under one second
    /// - The collaborator timeout is zero
    /// - An invalid grant type is specified
    /// - The signing algorithm is not supported
    /// - The JWT secret is shorter than [`MIN_SECRET_LEN`]
    ///
    /// Returns `ConfigError::Missing` if the `jwt` format has no secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        // Lifetimes are reported in whole seconds.
        for (name, value) in [
            ("access_token_lifetime", self.oauth.access_token_lifetime),
            ("refresh_token_lifetime", self.oauth.refresh_token_lifetime),
            ("id_token_lifetime", self.oauth.id_token_lifetime),
        ] {
            if value < Duration::from_secs(1) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be at least 1s",
                    name
                )));
            }
        }

        if self.oauth.collaborator_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "collaborator_timeout must be > 0".to_string(),
            ));
        }

        self.oauth.enabled_grant_types()?;

        match self.signing.algorithm.as_str() {
            "HS256" | "HS384" | "HS512" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be HS256, HS384, or HS512",
                    other
                )));
            }
        }

        if self.signing.format == TokenFormat::Jwt {
            match &self.signing.secret {
                None => return Err(ConfigError::Missing("signing.secret".to_string())),
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(ConfigError::InvalidValue(format!(
                        "signing.secret must be at least {} bytes",
                        MIN_SECRET_LEN
                    )));
                }
                Some(_) => {}
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "logging.level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Layered configuration loading.
pub mod loader {
    use super::{AuthConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::Path;

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "octoid.toml";

    /// Loads and validates configuration.
    ///
    /// Sources, lowest precedence first: built-in defaults, the file at
    /// `path` (or [`DEFAULT_CONFIG_FILE`] if present), then environment
    /// variables such as `OCTOID__OAUTH__ACCESS_TOKEN_LIFETIME=30m`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if an explicit `path` does not exist or
    /// the sources cannot be merged, and a validation error otherwise.
    pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::Load(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                builder = builder.add_source(File::from(p));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("OCTOID")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?;
        let merged: AuthConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }
}
