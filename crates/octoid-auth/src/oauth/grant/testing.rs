//! Mock collaborators shared by the handler and dispatcher tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::oauth::grant::TokenIssuer;
use crate::oauth::pkce::s256_challenge;
use crate::oauth::session::AuthorizationRequest;
use crate::storage::{
    AuthorizationRequestStorage, ClientStorage, DeviceCodeStorage, RefreshTokenStorage,
};
use crate::token::{TokenContext, TokenGenerator, TokenKind};
use crate::types::{Client, DeviceAuthorization, GrantType, RefreshTokenRecord};

pub const CLIENT_ID: &str = "test-client";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const VERIFIER: &str = "verifier-xyz";
pub const CODE: &str = "code-123";
pub const STATE: &str = "state-abc";

/// How a mock store answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Normal,
    Fail,
    Slow,
}

async fn misbehave(behavior: Behavior) -> AuthResult<()> {
    match behavior {
        Behavior::Normal => Ok(()),
        Behavior::Fail => Err(AuthError::storage("backend unavailable")),
        Behavior::Slow => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }
}

// ============================================================================
// Generators
// ============================================================================

/// Counts calls and returns `<kind>-<n>` values.
#[derive(Default)]
pub struct CountingGenerator {
    calls: AtomicUsize,
    kinds: Mutex<Vec<TokenKind>>,
}

impl CountingGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenGenerator for CountingGenerator {
    async fn generate(&self, context: &TokenContext) -> AuthResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds.lock().unwrap().push(context.kind);
        Ok(format!("{}-{}", context.kind, n))
    }
}

/// Always fails.
pub struct FailingGenerator;

#[async_trait]
impl TokenGenerator for FailingGenerator {
    async fn generate(&self, _context: &TokenContext) -> AuthResult<String> {
        Err(AuthError::token_generation("entropy source unavailable"))
    }
}

/// Never answers within a test deadline.
pub struct SlowGenerator;

#[async_trait]
impl TokenGenerator for SlowGenerator {
    async fn generate(&self, _context: &TokenContext) -> AuthResult<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("late".to_string())
    }
}

pub fn issuer_with(generator: Arc<dyn TokenGenerator>) -> TokenIssuer {
    TokenIssuer::from_config(generator, &OAuthConfig::default())
}

pub fn fast_issuer_with(generator: Arc<dyn TokenGenerator>) -> TokenIssuer {
    let config = OAuthConfig {
        collaborator_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    TokenIssuer::from_config(generator, &config)
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn test_client(grants: Vec<GrantType>) -> Client {
    Client::new(CLIENT_ID, grants).with_redirect_uri(REDIRECT_URI)
}

pub fn authorization_request(scope: &str) -> AuthorizationRequest {
    AuthorizationRequest::new(CLIENT_ID, "alice", scope, REDIRECT_URI, s256_challenge(VERIFIER))
        .with_code(CODE)
        .with_state(STATE)
}

// ============================================================================
// Stores
// ============================================================================

pub struct MockClientStorage {
    clients: Mutex<HashMap<String, Client>>,
    behavior: Behavior,
    lookups: AtomicUsize,
}

impl MockClientStorage {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            behavior,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_client(self, client: Client) -> Self {
        self.clients
            .lock()
            .unwrap()
            .insert(client.client_id.clone(), client);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientStorage for MockClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        misbehave(self.behavior).await?;
        Ok(self.clients.lock().unwrap().get(client_id).cloned())
    }
}

pub struct MockAuthorizationRequestStorage {
    requests: Mutex<HashMap<String, AuthorizationRequest>>,
    behavior: Behavior,
    consumes: AtomicUsize,
}

impl MockAuthorizationRequestStorage {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            behavior,
            consumes: AtomicUsize::new(0),
        }
    }

    pub fn with_request(self, request: AuthorizationRequest) -> Self {
        self.requests
            .lock()
            .unwrap()
            .insert(request.code.clone(), request);
        self
    }

    pub fn consumes(&self) -> usize {
        self.consumes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationRequestStorage for MockAuthorizationRequestStorage {
    async fn create(&self, request: &AuthorizationRequest) -> AuthResult<()> {
        self.requests
            .lock()
            .unwrap()
            .insert(request.code.clone(), request.clone());
        Ok(())
    }

    async fn consume(&self, code: &str) -> AuthResult<Option<AuthorizationRequest>> {
        self.consumes.fetch_add(1, Ordering::SeqCst);
        misbehave(self.behavior).await?;
        Ok(self.requests.lock().unwrap().remove(code))
    }
}

pub struct MockRefreshTokenStorage {
    records: Mutex<HashMap<String, RefreshTokenRecord>>,
    behavior: Behavior,
}

impl MockRefreshTokenStorage {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            behavior,
        }
    }

    pub fn with_record(self, record: RefreshTokenRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.token_hash.clone(), record);
        self
    }
}

#[async_trait]
impl RefreshTokenStorage for MockRefreshTokenStorage {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        misbehave(self.behavior).await?;
        Ok(self.records.lock().unwrap().get(token_hash).cloned())
    }
}

pub struct MockDeviceCodeStorage {
    authorizations: Mutex<HashMap<String, DeviceAuthorization>>,
    behavior: Behavior,
}

impl MockDeviceCodeStorage {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            authorizations: Mutex::new(HashMap::new()),
            behavior,
        }
    }

    pub fn with_authorization(self, authorization: DeviceAuthorization) -> Self {
        self.authorizations
            .lock()
            .unwrap()
            .insert(authorization.device_code.clone(), authorization);
        self
    }
}

#[async_trait]
impl DeviceCodeStorage for MockDeviceCodeStorage {
    async fn create(&self, authorization: &DeviceAuthorization) -> AuthResult<()> {
        self.authorizations
            .lock()
            .unwrap()
            .insert(authorization.device_code.clone(), authorization.clone());
        Ok(())
    }

    async fn poll(&self, device_code: &str) -> AuthResult<Option<DeviceAuthorization>> {
        misbehave(self.behavior).await?;
        Ok(self.authorizations.lock().unwrap().get(device_code).cloned())
    }
}
