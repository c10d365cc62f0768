//! Grant dispatch.
//!
//! The [`GrantDispatcher`] is the entry point of the token exchange engine.
//! For every request it:
//!
//! 1. Rejects unknown grant types (`unsupported_grant_type`)
//! 2. Resolves the client (`invalid_client` if missing or unknown)
//! 3. Checks the client declares the grant (`unsupported_grant_type`)
//! 4. Delegates to the handler registered for the grant
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = GrantDispatcher::builder(clients)
//!     .config(config)
//!     .authorization_requests(requests)
//!     .refresh_tokens(refresh_tokens)
//!     .build()?;
//!
//! let response = dispatcher.respond(&request).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::grant::{
    AuthorizationCodeGrant, ClientCredentialsGrant, DeviceCodeGrant, GrantHandler,
    RefreshTokenGrant, TokenIssuer, bounded,
};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::storage::{
    AuthorizationRequestStorage, ClientStorage, DeviceCodeStorage, RefreshTokenStorage,
};
use crate::token::{TokenGenerator, generator_from_config};
use crate::types::GrantType;

/// Routes token requests to grant handlers.
pub struct GrantDispatcher {
    clients: Arc<dyn ClientStorage>,
    handlers: HashMap<GrantType, Arc<dyn GrantHandler>>,
    deadline: Duration,
}

impl GrantDispatcher {
    /// Creates a dispatcher without handlers.
    ///
    /// `deadline` bounds the client lookup.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>, deadline: Duration) -> Self {
        Self {
            clients,
            handlers: HashMap::new(),
            deadline,
        }
    }

    /// Starts a configuration-driven builder.
    #[must_use]
    pub fn builder(clients: Arc<dyn ClientStorage>) -> GrantDispatcherBuilder {
        GrantDispatcherBuilder::new(clients)
    }

    /// Registers `handler` for its grant type, returning the one it replaces.
    pub fn register(&mut self, handler: Arc<dyn GrantHandler>) -> Option<Arc<dyn GrantHandler>> {
        self.handlers.insert(handler.grant_type(), handler)
    }

    /// Registers `handler` for its grant type.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn GrantHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Returns `true` if a handler is registered for `grant_type`.
    #[must_use]
    pub fn supports(&self, grant_type: GrantType) -> bool {
        self.handlers.contains_key(&grant_type)
    }

    /// Grant types with a registered handler, sorted.
    #[must_use]
    pub fn grant_types(&self) -> Vec<GrantType> {
        let mut grant_types: Vec<_> = self.handlers.keys().copied().collect();
        grant_types.sort();
        grant_types
    }

    /// Adjudicates a token request.
    ///
    /// # Errors
    ///
    /// Returns an [`ExchangeError`]; only its protocol part may be sent to
    /// the caller.
    pub async fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, ExchangeError> {
        let result = self.dispatch(request).await;

        let grant_type = request.grant_type().map_or("unsupported", |g| g.as_str());
        match &result {
            Ok(_) => {
                info!(
                    client_id = %request.client_id,
                    grant_type = grant_type,
                    "Token request granted"
                );
            }
            Err(e) if e.diagnostic().is_server_error() => {
                error!(
                    client_id = %request.client_id,
                    grant_type = grant_type,
                    category = %e.diagnostic().category(),
                    error = %e.diagnostic(),
                    "Token request failed"
                );
            }
            Err(e) => {
                warn!(
                    client_id = %request.client_id,
                    grant_type = grant_type,
                    error_code = %e.error().error,
                    error = %e.diagnostic(),
                    "Token request rejected"
                );
            }
        }

        result
    }

    /// Adjudicates a token request, folding failures into the response.
    pub async fn respond(&self, request: &TokenRequest) -> TokenResponse {
        self.exchange(request)
            .await
            .unwrap_or_else(TokenResponse::from)
    }

    async fn dispatch(&self, request: &TokenRequest) -> Result<TokenResponse, ExchangeError> {
        let Some(grant_type) = request.grant_type() else {
            return Err(AuthError::unsupported_grant_type("unknown grant_type").into());
        };

        if request.client_id.is_empty() {
            return Err(AuthError::invalid_client("client_id is required").into());
        }

        let client = bounded(
            self.deadline,
            "looking up client",
            self.clients.find_by_client_id(&request.client_id),
        )
        .await?
        .ok_or_else(|| AuthError::invalid_client("unknown client"))?;

        if !client.is_grant_type_allowed(grant_type) {
            return Err(AuthError::unsupported_grant_type(grant_type.as_str()).into());
        }

        let handler = self
            .handlers
            .get(&grant_type)
            .ok_or_else(|| AuthError::unsupported_grant_type(grant_type.as_str()))?;

        handler.handle(&client, request).await
    }
}

impl std::fmt::Debug for GrantDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantDispatcher")
            .field("grant_types", &self.grant_types())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Builds a [`GrantDispatcher`] from configuration and collaborators.
///
/// A handler is registered for every enabled grant type whose store was
/// supplied. client_credentials needs no store.
pub struct GrantDispatcherBuilder {
    clients: Arc<dyn ClientStorage>,
    config: AuthConfig,
    generator: Option<Arc<dyn TokenGenerator>>,
    authorization_requests: Option<Arc<dyn AuthorizationRequestStorage>>,
    refresh_tokens: Option<Arc<dyn RefreshTokenStorage>>,
    device_codes: Option<Arc<dyn DeviceCodeStorage>>,
}

impl GrantDispatcherBuilder {
    fn new(clients: Arc<dyn ClientStorage>) -> Self {
        Self {
            clients,
            config: AuthConfig::default(),
            generator: None,
            authorization_requests: None,
            refresh_tokens: None,
            device_codes: None,
        }
    }

    /// Sets the configuration (defaults to [`AuthConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the generator selected by `signing.format`.
    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Supplies the authorization request store.
    #[must_use]
    pub fn authorization_requests(mut self, store: Arc<dyn AuthorizationRequestStorage>) -> Self {
        self.authorization_requests = Some(store);
        self
    }

    /// Supplies the refresh token store.
    #[must_use]
    pub fn refresh_tokens(mut self, store: Arc<dyn RefreshTokenStorage>) -> Self {
        self.refresh_tokens = Some(store);
        self
    }

    /// Supplies the device authorization store.
    #[must_use]
    pub fn device_codes(mut self, store: Arc<dyn DeviceCodeStorage>) -> Self {
        self.device_codes = Some(store);
        self
    }

    /// Validates the configuration and builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn build(self) -> Result<GrantDispatcher, ConfigError> {
        self.config.validate()?;

        let generator = match self.generator {
            Some(generator) => generator,
            None => generator_from_config(&self.config)?,
        };
        let issuer = TokenIssuer::from_config(generator, &self.config.oauth);

        let mut dispatcher = GrantDispatcher::new(self.clients, issuer.deadline());
        for grant_type in self.config.oauth.enabled_grant_types()? {
            let handler: Option<Arc<dyn GrantHandler>> = match grant_type {
                GrantType::AuthorizationCode => self.authorization_requests.clone().map(|s| {
                    Arc::new(AuthorizationCodeGrant::new(s, issuer.clone())) as Arc<dyn GrantHandler>
                }),
                GrantType::ClientCredentials => {
                    Some(Arc::new(ClientCredentialsGrant::new(issuer.clone())) as Arc<dyn GrantHandler>)
                }
                GrantType::RefreshToken => self.refresh_tokens.clone().map(|s| {
                    Arc::new(RefreshTokenGrant::new(s, issuer.clone())) as Arc<dyn GrantHandler>
                }),
                GrantType::DeviceCode => self.device_codes.clone().map(|s| {
                    Arc::new(DeviceCodeGrant::new(s, issuer.clone())) as Arc<dyn GrantHandler>
                }),
            };

            match handler {
                Some(handler) => {
                    dispatcher.register(handler);
                }
                None => {
                    warn!(
                        grant_type = %grant_type,
                        "Grant type enabled but no store supplied; not serving it"
                    );
                }
            }
        }

        info!(
            grant_types = ?dispatcher.grant_types(),
            "Token exchange engine ready"
        );

        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::error::TokenErrorCode;
    use crate::oauth::grant::testing::*;
    use crate::oauth::token::GrantRequest;

    struct Fixture {
        clients: Arc<MockClientStorage>,
        requests: Arc<MockAuthorizationRequestStorage>,
        generator: Arc<CountingGenerator>,
        dispatcher: GrantDispatcher,
    }

    fn fixture(clients: MockClientStorage) -> Fixture {
        let clients = Arc::new(clients);
        let requests = Arc::new(
            MockAuthorizationRequestStorage::new(Behavior::Normal)
                .with_request(authorization_request("openid offline_access")),
        );
        let generator = CountingGenerator::new();
        let dispatcher = GrantDispatcher::builder(clients.clone())
            .generator(generator.clone())
            .authorization_requests(requests.clone())
            .build()
            .unwrap();
        Fixture {
            clients,
            requests,
            generator,
            dispatcher,
        }
    }

    fn registered(grants: Vec<GrantType>) -> MockClientStorage {
        MockClientStorage::new(Behavior::Normal).with_client(test_client(grants))
    }

    fn code_request(client_id: &str) -> TokenRequest {
        TokenRequest::new(
            client_id,
            GrantRequest::authorization_code(CODE, VERIFIER, REDIRECT_URI),
        )
    }

    #[tokio::test]
    async fn test_exchange_delegates_to_handler() {
        let f = fixture(registered(vec![GrantType::AuthorizationCode]));

        let response = f.dispatcher.exchange(&code_request(CLIENT_ID)).await.unwrap();

        let token = response.openid().unwrap();
        assert!(token.refresh_token.is_some());
        assert_eq!(f.requests.consumes(), 1);
        assert_eq!(f.generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_grant_type_rejected_before_client_lookup() {
        let f = fixture(registered(vec![GrantType::AuthorizationCode]));
        let request = TokenRequest::new(CLIENT_ID, GrantRequest::Unsupported);

        let err = f.dispatcher.exchange(&request).await.unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::UnsupportedGrantType);
        assert_eq!(f.clients.lookups(), 0);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_client_is_invalid_client() {
        let f = fixture(registered(vec![GrantType::AuthorizationCode]));

        let err = f.dispatcher.exchange(&code_request("")).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidClient);
        assert_eq!(err.error().http_status(), 401);

        let err = f.dispatcher.exchange(&code_request("nobody")).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidClient);
        assert_eq!(f.requests.consumes(), 0);
    }

    #[tokio::test]
    async fn test_client_store_failure_is_server_error() {
        let f = fixture(MockClientStorage::new(Behavior::Fail));

        let err = f.dispatcher.exchange(&code_request(CLIENT_ID)).await.unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::ServerError);
        assert_eq!(err.error().http_status(), 500);
    }

    #[tokio::test]
    async fn test_slow_client_store_times_out() {
        let clients = Arc::new(MockClientStorage::new(Behavior::Slow));
        let dispatcher = GrantDispatcher::new(clients, Duration::from_millis(20));

        let err = dispatcher.exchange(&code_request(CLIENT_ID)).await.unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::ServerError);
        assert!(matches!(err.diagnostic(), AuthError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_undeclared_grant_rejected_before_handler() {
        let f = fixture(registered(vec![GrantType::ClientCredentials]));

        let err = f.dispatcher.exchange(&code_request(CLIENT_ID)).await.unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::UnsupportedGrantType);
        assert_eq!(f.requests.consumes(), 0);
    }

    #[tokio::test]
    async fn test_grant_without_handler_is_unsupported() {
        let f = fixture(registered(vec![GrantType::RefreshToken]));
        assert!(!f.dispatcher.supports(GrantType::RefreshToken));

        let request = TokenRequest::new(
            CLIENT_ID,
            GrantRequest::RefreshToken {
                refresh_token: "rt".to_string(),
                scope: None,
            },
        );
        let err = f.dispatcher.exchange(&request).await.unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::UnsupportedGrantType);
    }

    #[tokio::test]
    async fn test_respond_folds_errors_with_state() {
        let f = fixture(registered(vec![GrantType::AuthorizationCode]));
        let request = TokenRequest::new(
            CLIENT_ID,
            GrantRequest::authorization_code(CODE, "wrong", REDIRECT_URI),
        );

        let response = f.dispatcher.respond(&request).await;

        assert!(response.is_error());
        assert!(response.openid().is_none());
        let error = response.error().unwrap();
        assert_eq!(error.error, TokenErrorCode::InvalidGrant);
        assert_eq!(error.state.as_deref(), Some(STATE));
    }

    #[tokio::test]
    async fn test_builder_registers_enabled_grants_with_stores() {
        let f = fixture(registered(vec![]));
        assert_eq!(
            f.dispatcher.grant_types(),
            vec![GrantType::AuthorizationCode, GrantType::ClientCredentials]
        );

        let mut config = AuthConfig::default();
        config.oauth.grant_types = vec!["client_credentials".to_string()];
        let dispatcher = GrantDispatcher::builder(Arc::new(MockClientStorage::new(Behavior::Normal)))
            .config(config)
            .authorization_requests(Arc::new(MockAuthorizationRequestStorage::new(Behavior::Normal)))
            .build()
            .unwrap();
        assert_eq!(dispatcher.grant_types(), vec![GrantType::ClientCredentials]);
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let config = AuthConfig {
            issuer: String::new(),
            ..Default::default()
        };
        let result = GrantDispatcher::builder(Arc::new(MockClientStorage::new(Behavior::Normal)))
            .config(config)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_register_replaces_handler() {
        let mut dispatcher = GrantDispatcher::new(
            Arc::new(MockClientStorage::new(Behavior::Normal)),
            Duration::from_secs(1),
        );
        let issuer = issuer_with(CountingGenerator::new());
        assert!(dispatcher
            .register(Arc::new(ClientCredentialsGrant::new(issuer.clone())))
            .is_none());
        assert!(dispatcher
            .register(Arc::new(ClientCredentialsGrant::new(issuer)))
            .is_some());
        assert!(dispatcher.supports(GrantType::ClientCredentials));
    }
}
