//! OAuth 2.0 client registration types.
//!
//! Clients are provisioned by an external registration service. The engine
//! only reads them, and treats the registered grant types and redirect URIs
//! as authoritative: request values are always checked for membership.

use std::str::FromStr;

use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrantType {
    /// Authorization Code flow with PKCE (RFC 6749 §4.1, RFC 7636).
    #[serde(rename = "authorization_code")]
    AuthorizationCode,
    /// Client Credentials flow (RFC 6749 §4.4).
    #[serde(rename = "client_credentials")]
    ClientCredentials,
    /// Refresh Token flow (RFC 6749 §6).
    #[serde(rename = "refresh_token")]
    RefreshToken,
    /// Device Authorization Grant (RFC 8628).
    #[serde(rename = "urn:ietf:params:oauth:grant-type:device_code")]
    DeviceCode,
}

impl GrantType {
    /// Every grant type the engine can dispatch.
    pub const ALL: [GrantType; 4] = [
        Self::AuthorizationCode,
        Self::ClientCredentials,
        Self::RefreshToken,
        Self::DeviceCode,
    ];

    /// Returns the OAuth 2.0 `grant_type` parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
            Self::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Registered relying party.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Human-readable display name.
    #[serde(default)]
    pub name: String,

    /// Grant types this client is allowed to use.
    pub grant_types: Vec<GrantType>,

    /// Redirect URIs registered for the authorization code flow.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Scopes this client is allowed to request.
    /// Empty list means all scopes are allowed.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Whether this is a confidential client.
    #[serde(default)]
    pub confidential: bool,

    /// Public keys of the client (signed request objects, assertions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<JwkSet>,
}

impl Client {
    /// Creates a client with the given id and grant types and nothing else
    /// registered.
    #[must_use]
    pub fn new(client_id: impl Into<String>, grant_types: Vec<GrantType>) -> Self {
        Self {
            client_id: client_id.into(),
            name: String::new(),
            grant_types,
            redirect_uris: Vec::new(),
            scopes: Vec::new(),
            confidential: false,
            jwks: None,
        }
    }

    /// Adds a registered redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.push(uri.into());
        self
    }

    /// Adds an allowed scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Marks the client as confidential.
    #[must_use]
    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }

    /// Validates the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is inconsistent.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.grant_types.is_empty() {
            return Err(ClientValidationError::NoGrantTypes);
        }

        if !self.confidential && self.grant_types.contains(&GrantType::ClientCredentials) {
            return Err(ClientValidationError::PublicClientCredentials);
        }

        if self.grant_types.contains(&GrantType::AuthorizationCode) && self.redirect_uris.is_empty()
        {
            return Err(ClientValidationError::NoRedirectUris);
        }

        Ok(())
    }

    /// Checks if the given redirect URI is registered for this client.
    ///
    /// Comparison is exact, no normalization.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if the given scope is allowed for this client.
    ///
    /// An empty scopes list means all scopes are allowed.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|allowed| allowed == scope)
    }

    /// Checks if the given grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// At least one grant type is required.
    #[error("At least one grant type is required")]
    NoGrantTypes,

    /// Public clients cannot use client_credentials grant.
    #[error("Public clients cannot use client_credentials grant")]
    PublicClientCredentials,

    /// Authorization code flow requires redirect URIs.
    #[error("Authorization code flow requires redirect URIs")]
    NoRedirectUris,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_client() -> Client {
        Client::new("web-app", vec![GrantType::AuthorizationCode])
            .with_redirect_uri("https://app.example.com/callback")
    }

    #[test]
    fn test_grant_type_wire_names() {
        assert_eq!(GrantType::AuthorizationCode.as_str(), "authorization_code");
        assert_eq!(
            GrantType::DeviceCode.to_string(),
            "urn:ietf:params:oauth:grant-type:device_code"
        );
        assert_eq!(
            "refresh_token".parse::<GrantType>(),
            Ok(GrantType::RefreshToken)
        );
        assert_eq!("password".parse::<GrantType>(), Err("password".to_string()));
    }

    #[test]
    fn test_grant_type_serde() {
        let json = serde_json::to_string(&GrantType::ClientCredentials).unwrap();
        assert_eq!(json, r#""client_credentials""#);

        let parsed: GrantType =
            serde_json::from_str(r#""urn:ietf:params:oauth:grant-type:device_code""#).unwrap();
        assert_eq!(parsed, GrantType::DeviceCode);
    }

    #[test]
    fn test_client_deserialization() {
        let json = r#"{
            "clientId": "web-app",
            "name": "Web App",
            "grantTypes": ["authorization_code", "refresh_token"],
            "redirectUris": ["https://app.example.com/callback"]
        }"#;

        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.client_id, "web-app");
        assert!(client.is_grant_type_allowed(GrantType::RefreshToken));
        assert!(!client.is_grant_type_allowed(GrantType::ClientCredentials));
        assert!(client.scopes.is_empty());
        assert!(client.jwks.is_none());
    }

    #[test]
    fn test_redirect_uri_exact_match() {
        let client = web_client();
        assert!(client.is_redirect_uri_allowed("https://app.example.com/callback"));
        assert!(!client.is_redirect_uri_allowed("https://app.example.com/callback/"));
        assert!(!client.is_redirect_uri_allowed("https://evil.example.com/callback"));
    }

    #[test]
    fn test_scope_allowed() {
        let client = web_client();
        assert!(client.is_scope_allowed("anything"));

        let client = client.with_scope("openid");
        assert!(client.is_scope_allowed("openid"));
        assert!(!client.is_scope_allowed("admin"));
    }

    #[test]
    fn test_validate() {
        assert!(web_client().validate().is_ok());

        let client = Client::new("", vec![GrantType::AuthorizationCode]);
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::EmptyClientId)
        ));

        let client = Client::new("svc", vec![]);
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::NoGrantTypes)
        ));

        let client = Client::new("svc", vec![GrantType::ClientCredentials]);
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::PublicClientCredentials)
        ));
        assert!(client.confidential().validate().is_ok());

        let client = Client::new("spa", vec![GrantType::AuthorizationCode]);
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::NoRedirectUris)
        ));
    }
}
