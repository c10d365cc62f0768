//! Client credentials grant (RFC 6749 §4.4).
//!
//! The client acts on its own behalf, so the subject of the issued token is
//! the client itself. Only an access token is issued. Client authentication
//! happens before the engine is reached.

use async_trait::async_trait;
use tracing::debug;

use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::grant::{
    GrantHandler, Grantee, TokenIssuer, ensure_capability, payload_mismatch,
};
use crate::oauth::token::{GrantRequest, TokenRequest, TokenResponse};
use crate::types::{Client, GrantType, Scopes};

/// Issues access tokens to clients acting for themselves.
pub struct ClientCredentialsGrant {
    issuer: TokenIssuer,
}

impl ClientCredentialsGrant {
    /// Creates the handler.
    #[must_use]
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }

    /// Resolves the scope to grant.
    ///
    /// An absent or blank request scope falls back to everything the client
    /// registered.
    fn granted_scopes(client: &Client, requested: Option<&str>) -> Result<Scopes, AuthError> {
        let requested = requested.map(Scopes::parse).unwrap_or_default();
        if requested.is_empty() {
            return Ok(client.scopes.iter().collect());
        }

        if let Some(denied) = requested.iter().find(|s| !client.is_scope_allowed(s)) {
            return Err(AuthError::invalid_scope(format!(
                "scope '{}' is not allowed for this client",
                denied
            )));
        }

        Ok(requested)
    }
}

#[async_trait]
impl GrantHandler for ClientCredentialsGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    async fn handle(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let GrantRequest::ClientCredentials { scope } = &request.grant else {
            return Err(payload_mismatch(GrantType::ClientCredentials));
        };

        ensure_capability(client, GrantType::ClientCredentials)?;

        let scopes = Self::granted_scopes(client, scope.as_deref())?;

        let response = self
            .issuer
            .issue(
                GrantType::ClientCredentials,
                Grantee {
                    client_id: &client.client_id,
                    subject: &client.client_id,
                    nonce: None,
                },
                &scopes,
            )
            .await?;

        debug!(client_id = %client.client_id, scope = %scopes, "Client credentials granted");

        Ok(response)
    }
}
