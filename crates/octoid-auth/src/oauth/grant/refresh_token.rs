//! Refresh token grant (RFC 6749 §6).
//!
//! Issues a new access token from a stored refresh token. The engine never
//! writes, so refresh tokens are not rotated: the presented token stays
//! valid until it expires or is revoked elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::grant::{
    GrantHandler, Grantee, TokenIssuer, ensure_capability, payload_mismatch,
};
use crate::oauth::token::{GrantRequest, TokenRequest, TokenResponse};
use crate::storage::RefreshTokenStorage;
use crate::types::{Client, GrantType, RefreshTokenRecord, Scopes};

/// Exchanges refresh tokens for access tokens.
pub struct RefreshTokenGrant {
    tokens: Arc<dyn RefreshTokenStorage>,
    issuer: TokenIssuer,
}

impl RefreshTokenGrant {
    /// Creates the handler.
    #[must_use]
    pub fn new(tokens: Arc<dyn RefreshTokenStorage>, issuer: TokenIssuer) -> Self {
        Self { tokens, issuer }
    }
}

#[async_trait]
impl GrantHandler for RefreshTokenGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    async fn handle(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let GrantRequest::RefreshToken {
            refresh_token,
            scope,
        } = &request.grant
        else {
            return Err(payload_mismatch(GrantType::RefreshToken));
        };

        ensure_capability(client, GrantType::RefreshToken)?;

        if refresh_token.is_empty() {
            return Err(AuthError::invalid_grant("refresh_token is required").into());
        }

        let hash = RefreshTokenRecord::hash_token(refresh_token);
        let record = self
            .issuer
            .bounded("looking up refresh token", self.tokens.find_by_hash(&hash))
            .await?
            .ok_or_else(|| AuthError::invalid_grant("refresh token not found"))?;

        if record.client_id != client.client_id {
            return Err(AuthError::invalid_grant(format!(
                "refresh token was issued to client '{}'",
                record.client_id
            ))
            .into());
        }
        if record.is_revoked() {
            return Err(AuthError::invalid_grant("refresh token revoked").into());
        }
        if record.is_expired() {
            return Err(AuthError::invalid_grant("refresh token expired").into());
        }

        let original = Scopes::parse(&record.scope);
        let scopes = match scope.as_deref().map(Scopes::parse) {
            Some(requested) if !requested.is_empty() => {
                if !requested.is_subset(&original) {
                    return Err(AuthError::invalid_scope(
                        "requested scope exceeds the original grant",
                    )
                    .into());
                }
                requested
            }
            _ => original,
        };

        let response = self
            .issuer
            .issue(
                GrantType::RefreshToken,
                Grantee {
                    client_id: &client.client_id,
                    subject: &record.subject,
                    nonce: None,
                },
                &scopes,
            )
            .await?;

        debug!(client_id = %client.client_id, scope = %scopes, "Refresh token redeemed");

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::error::TokenErrorCode;
    use crate::oauth::grant::testing::*;
    use time::{Duration, OffsetDateTime};

    const TOKEN: &str = "rt-plaintext";

    fn client() -> Client {
        test_client(vec![GrantType::RefreshToken])
    }

    fn record() -> RefreshTokenRecord {
        RefreshTokenRecord::new(TOKEN, CLIENT_ID, "alice", "openid offline_access profile")
    }

    fn grant_with(record: RefreshTokenRecord) -> (RefreshTokenGrant, Arc<CountingGenerator>) {
        let store = Arc::new(MockRefreshTokenStorage::new(Behavior::Normal).with_record(record));
        let generator = CountingGenerator::new();
        (
            RefreshTokenGrant::new(store, issuer_with(generator.clone())),
            generator,
        )
    }

    fn request(token: &str, scope: Option<&str>) -> TokenRequest {
        TokenRequest::new(
            CLIENT_ID,
            GrantRequest::RefreshToken {
                refresh_token: token.to_string(),
                scope: scope.map(str::to_string),
            },
        )
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token_only() {
        let (grant, generator) = grant_with(record());

        let response = grant.handle(&client(), &request(TOKEN, None)).await.unwrap();

        let token = response.openid().unwrap();
        assert!(token.refresh_token.is_none());
        assert_eq!(token.scope.as_deref(), Some("openid offline_access profile"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_narrowed_scope() {
        let (grant, _) = grant_with(record());

        let response = grant
            .handle(&client(), &request(TOKEN, Some("profile")))
            .await
            .unwrap();

        assert_eq!(response.openid().unwrap().scope.as_deref(), Some("profile"));
    }

    #[tokio::test]
    async fn test_widened_scope_is_invalid_scope() {
        let (grant, generator) = grant_with(record());

        let err = grant
            .handle(&client(), &request(TOKEN, Some("openid admin")))
            .await
            .unwrap_err();

        assert_eq!(err.error().error, TokenErrorCode::InvalidScope);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid_grant() {
        let (grant, _) = grant_with(record());

        let err = grant
            .handle(&client(), &request("not-issued", None))
            .await
            .unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidGrant);

        let err = grant.handle(&client(), &request("", None)).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidGrant);
    }

    #[tokio::test]
    async fn test_token_of_another_client_is_invalid_grant() {
        let (grant, _) = grant_with(RefreshTokenRecord::new(TOKEN, "other", "alice", "openid"));

        let err = grant.handle(&client(), &request(TOKEN, None)).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidGrant);
    }

    #[tokio::test]
    async fn test_revoked_or_expired_token_is_invalid_grant() {
        let mut revoked = record();
        revoked.revoked_at = Some(OffsetDateTime::now_utc());
        let (grant, _) = grant_with(revoked);
        let err = grant.handle(&client(), &request(TOKEN, None)).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidGrant);

        let expired = record().expiring_at(OffsetDateTime::now_utc() - Duration::minutes(1));
        let (grant, _) = grant_with(expired);
        let err = grant.handle(&client(), &request(TOKEN, None)).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::InvalidGrant);
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let store = Arc::new(MockRefreshTokenStorage::new(Behavior::Fail));
        let grant = RefreshTokenGrant::new(store, issuer_with(CountingGenerator::new()));

        let err = grant.handle(&client(), &request(TOKEN, None)).await.unwrap_err();
        assert_eq!(err.error().error, TokenErrorCode::ServerError);
    }
}
