//! Device authorization grant, token polling (RFC 8628 §3.4-3.5).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AuthError;
use crate::oauth::error::ExchangeError;
use crate::oauth::grant::{
    GrantHandler, Grantee, TokenIssuer, ensure_capability, payload_mismatch,
};
use crate::oauth::token::{GrantRequest, TokenRequest, TokenResponse};
use crate::storage::DeviceCodeStorage;
use crate::types::{Client, DeviceAuthorizationStatus, GrantType, Scopes};

/// Answers device polls, issuing tokens once the user approved.
///
/// Issuance follows the same scope policy as the authorization code grant:
/// an approved authorization whose scope lacks `openid` yields a success
/// without any token. The store has already handed the approval out by
/// then, so the device cannot poll for it again. Hosts that need an access
/// token for every approval must include `openid` in the device scope.
pub struct DeviceCodeGrant {
    devices: Arc<dyn DeviceCodeStorage>,
    issuer: TokenIssuer,
}

impl DeviceCodeGrant {
    /// Creates the handler.
    #[must_use]
    pub fn new(devices: Arc<dyn DeviceCodeStorage>, issuer: TokenIssuer) -> Self {
        Self { devices, issuer }
    }
}

#[async_trait]
impl GrantHandler for DeviceCodeGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::DeviceCode
    }

    async fn handle(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let GrantRequest::DeviceCode { device_code } = &request.grant else {
            return Err(payload_mismatch(GrantType::DeviceCode));
        };

        ensure_capability(client, GrantType::DeviceCode)?;

        if device_code.is_empty() {
            return Err(AuthError::invalid_grant("device_code is required").into());
        }

        let authorization = self
            .issuer
            .bounded("polling device authorization", self.devices.poll(device_code))
            .await?
            .ok_or_else(|| AuthError::invalid_grant("device code not found"))?;

        if authorization.client_id != client.client_id {
            return Err(AuthError::invalid_grant(format!(
                "device code was issued to client '{}'",
                authorization.client_id
            ))
            .into());
        }

        if authorization.is_expired() {
            return Err(AuthError::ExpiredToken.into());
        }

        let subject = match &authorization.status {
            DeviceAuthorizationStatus::Pending => return Err(AuthError::AuthorizationPending.into()),
            DeviceAuthorizationStatus::SlowDown => return Err(AuthError::SlowDown.into()),
            DeviceAuthorizationStatus::Denied => {
                return Err(AuthError::access_denied("user denied the device").into());
            }
            DeviceAuthorizationStatus::Approved { subject } => subject,
        };

        let scopes = Scopes::parse(&authorization.scope);
        let response = self
            .issuer
            .issue(
                GrantType::DeviceCode,
                Grantee {
                    client_id: &client.client_id,
                    subject,
                    nonce: None,
                },
                &scopes,
            )
            .await?;

        debug!(client_id = %client.client_id, scope = %scopes, "Device authorization redeemed");

        Ok(response)
    }
}
