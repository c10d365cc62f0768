//! Grant handlers.
//!
//! Each grant type is one [`GrantHandler`]. Handlers share a [`TokenIssuer`]
//! that applies the [`ScopePolicy`] and calls the token generator under the
//! collaborator deadline.
//!
//! | Grant | Handler |
//! |-------|---------|
//! | `authorization_code` | [`AuthorizationCodeGrant`] |
//! | `client_credentials` | [`ClientCredentialsGrant`] |
//! | `refresh_token` | [`RefreshTokenGrant`] |
//! | `urn:ietf:params:oauth:grant-type:device_code` | [`DeviceCodeGrant`] |

pub mod authorization_code;
pub mod client_credentials;
pub mod device_code;
pub mod refresh_token;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::scope_policy::ScopePolicy;
use crate::oauth::token::{OpenIdToken, TokenRequest, TokenResponse};
use crate::token::{TokenContext, TokenGenerator, TokenKind};
use crate::types::{Client, GrantType, Scopes};

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use device_code::DeviceCodeGrant;
pub use refresh_token::RefreshTokenGrant;

/// A handler for one grant type.
///
/// The dispatcher resolves the client and checks that it declares the grant
/// before calling [`handle`](Self::handle). Handlers repeat the capability
/// check so they are safe to call directly.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    /// The grant type this handler serves.
    fn grant_type(&self) -> GrantType;

    /// Adjudicates `request` for `client`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExchangeError`] whose protocol part is safe to send to
    /// the caller.
    async fn handle(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError>;
}

/// Runs a collaborator call under `deadline`.
///
/// An elapsed deadline becomes `AuthError::Timeout` naming `operation`.
pub(crate) async fn bounded<T, F>(deadline: Duration, operation: &str, call: F) -> AuthResult<T>
where
    F: Future<Output = AuthResult<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| AuthError::timeout(operation))?
}

/// Rejects clients that do not declare `grant`.
pub(crate) fn ensure_capability(client: &Client, grant: GrantType) -> Result<(), ExchangeError> {
    if client.is_grant_type_allowed(grant) {
        Ok(())
    } else {
        Err(AuthError::unsupported_grant_type(grant.as_str()).into())
    }
}

/// The error for a payload that does not belong to the handler.
pub(crate) fn payload_mismatch(expected: GrantType) -> ExchangeError {
    AuthError::internal(format!("{} handler received another grant payload", expected)).into()
}

/// Who a token set is issued to.
#[derive(Debug, Clone, Copy)]
pub struct Grantee<'a> {
    /// Client ID.
    pub client_id: &'a str,
    /// Subject.
    pub subject: &'a str,
    /// OpenID Connect nonce, bound into ID tokens.
    pub nonce: Option<&'a str>,
}

/// Composes token responses.
///
/// Shared by all handlers of one engine.
#[derive(Clone)]
pub struct TokenIssuer {
    generator: Arc<dyn TokenGenerator>,
    policy: ScopePolicy,
    deadline: Duration,
}

impl TokenIssuer {
    /// Creates an issuer.
    #[must_use]
    pub fn new(generator: Arc<dyn TokenGenerator>, policy: ScopePolicy, deadline: Duration) -> Self {
        Self {
            generator,
            policy,
            deadline,
        }
    }

    /// Creates an issuer from the OAuth configuration.
    #[must_use]
    pub fn from_config(generator: Arc<dyn TokenGenerator>, config: &OAuthConfig) -> Self {
        Self::new(
            generator,
            ScopePolicy::from_config(config),
            config.collaborator_timeout,
        )
    }

    /// The collaborator deadline.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// The issuance policy.
    #[must_use]
    pub fn policy(&self) -> &ScopePolicy {
        &self.policy
    }

    /// Runs a storage call under the collaborator deadline.
    ///
    /// # Errors
    ///
    /// Propagates the call's error, or `AuthError::Timeout`.
    pub async fn bounded<T, F>(&self, operation: &str, call: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        bounded(self.deadline, operation, call).await
    }

    /// Issues what `grant` may issue for `scopes`.
    ///
    /// Returns a response without a token holder when the plan is empty.
    ///
    /// # Errors
    ///
    /// Returns a server fault if the generator fails or misses the deadline.
    pub async fn issue(
        &self,
        grant: GrantType,
        grantee: Grantee<'_>,
        scopes: &Scopes,
    ) -> AuthResult<TokenResponse> {
        let plan = self.policy.plan(grant, scopes);
        if plan.is_empty() {
            return Ok(TokenResponse::empty());
        }

        let scope = scopes.to_string();

        let access_token = self
            .generate(
                TokenKind::Access,
                grantee,
                &scope,
                self.policy.access_token_lifetime(),
            )
            .await?;
        let mut token = OpenIdToken::new(access_token, self.policy.expires_in());

        if plan.refresh_token {
            let refresh_token = self
                .generate(
                    TokenKind::Refresh,
                    grantee,
                    &scope,
                    self.policy.refresh_token_lifetime(),
                )
                .await?;
            token = token.with_refresh_token(refresh_token);
        }

        if plan.id_token {
            let id_token = self
                .generate(
                    TokenKind::Id,
                    grantee,
                    &scope,
                    self.policy.id_token_lifetime(),
                )
                .await?;
            token = token.with_id_token(id_token);
        }

        if !scope.is_empty() {
            token = token.with_scope(scope);
        }

        Ok(TokenResponse::issued(token))
    }

    async fn generate(
        &self,
        kind: TokenKind,
        grantee: Grantee<'_>,
        scope: &str,
        lifetime: Duration,
    ) -> AuthResult<String> {
        let context = TokenContext::new(kind, grantee.client_id, grantee.subject, scope, lifetime)
            .with_nonce(grantee.nonce.map(str::to_string));
        let operation = format!("generating {}", kind);
        bounded(self.deadline, &operation, self.generator.generate(&context)).await
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("policy", &self.policy)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
