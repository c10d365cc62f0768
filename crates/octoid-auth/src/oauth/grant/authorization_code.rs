//! Authorization code grant (RFC 6749 §4.1.3, RFC 7636).
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. The payload is an authorization_code payload (else `server_error`)
//! 2. The client declares the grant (else `unsupported_grant_type`)
//! 3. `code`, `code_verifier` and `redirect_uri` are present
//! 4. The code resolves to an authorization request, consumed on read
//! 5. The request was issued to this client and has not expired
//! 6. The redirect URI equals the stored one and is still registered
//! 7. The PKCE verifier matches the stored S256 challenge
//! 8. Tokens are issued from the stored scope
//!
//! Failures from step 5 on echo the stored `state`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::grant::{
    GrantHandler, Grantee, TokenIssuer, ensure_capability, payload_mismatch,
};
use crate::oauth::pkce::verify_code_verifier;
use crate::oauth::token::{GrantRequest, TokenRequest, TokenResponse};
use crate::storage::AuthorizationRequestStorage;
use crate::types::{Client, GrantType};

/// Exchanges authorization codes for tokens.
pub struct AuthorizationCodeGrant {
    requests: Arc<dyn AuthorizationRequestStorage>,
    issuer: TokenIssuer,
}

impl AuthorizationCodeGrant {
    /// Creates the handler.
    #[must_use]
    pub fn new(requests: Arc<dyn AuthorizationRequestStorage>, issuer: TokenIssuer) -> Self {
        Self { requests, issuer }
    }
}

#[async_trait]
impl GrantHandler for AuthorizationCodeGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    async fn handle(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let GrantRequest::AuthorizationCode {
            code,
            code_verifier,
            redirect_uri,
        } = &request.grant
        else {
            return Err(payload_mismatch(GrantType::AuthorizationCode));
        };

        ensure_capability(client, GrantType::AuthorizationCode)?;

        if code.is_empty() || code_verifier.is_empty() || redirect_uri.is_empty() {
            return Err(AuthError::invalid_grant(
                "code, code_verifier and redirect_uri are required",
            )
            .into());
        }

        let stored = self
            .issuer
            .bounded("consuming authorization request", self.requests.consume(code))
            .await?
            .ok_or_else(|| AuthError::invalid_grant("authorization code not found or already used"))?;

        // The grant is resolved: every failure from here on echoes its state.
        let state = Some(stored.state.as_str());
        let fail = |err: AuthError| ExchangeError::new(err, state);

        if stored.client_id != client.client_id {
            return Err(fail(AuthError::invalid_grant(format!(
                "authorization code was issued to client '{}'",
                stored.client_id
            ))));
        }

        if stored.is_expired() {
            return Err(fail(AuthError::invalid_grant("authorization code expired")));
        }

        if stored.redirect_uri != *redirect_uri {
            return Err(fail(AuthError::invalid_grant(
                "redirect_uri does not match the authorization request",
            )));
        }

        if !client.is_redirect_uri_allowed(redirect_uri) {
            return Err(fail(AuthError::invalid_grant(
                "redirect_uri is not registered for the client",
            )));
        }

        verify_code_verifier(
            code_verifier,
            &stored.code_challenge,
            &stored.code_challenge_method,
        )
        .map_err(|e| fail(e.into()))?;

        let response = self
            .issuer
            .issue(
                GrantType::AuthorizationCode,
                Grantee {
                    client_id: &client.client_id,
                    subject: &stored.subject,
                    nonce: stored.nonce.as_deref(),
                },
                &stored.scopes(),
            )
            .await
            .map_err(fail)?;

        debug!(
            client_id = %client.client_id,
            scope = %stored.scope,
            "Authorization code redeemed"
        );

        Ok(response)
    }
}
