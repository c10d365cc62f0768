//! Scope-gated token composition.
//!
//! Decides which artifacts a granted scope set entitles the caller to. The
//! scope always comes from the stored grant (authorization request, device
//! authorization or refresh token record), or for client_credentials from
//! the client registration. Lifetimes are policy values, never taken from
//! the request.

use std::time::Duration;

use crate::config::OAuthConfig;
use crate::types::{GrantType, OFFLINE_ACCESS, OPENID, Scopes};

/// The artifacts to issue for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssuancePlan {
    /// Issue an access token (and a token holder in the response).
    pub access_token: bool,
    /// Issue a refresh token.
    pub refresh_token: bool,
    /// Issue an ID token.
    pub id_token: bool,
}

impl IssuancePlan {
    /// A plan that issues nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A plan that issues only an access token.
    #[must_use]
    pub fn access_only() -> Self {
        Self {
            access_token: true,
            ..Self::default()
        }
    }

    /// Returns `true` if nothing is issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.access_token
    }
}

/// Issuance policy derived from configuration.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
    id_token_lifetime: Duration,
    issue_id_token: bool,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self::from_config(&OAuthConfig::default())
    }
}

impl ScopePolicy {
    /// Creates a policy from the OAuth configuration.
    #[must_use]
    pub fn from_config(config: &OAuthConfig) -> Self {
        Self {
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
            id_token_lifetime: config.id_token_lifetime,
            issue_id_token: config.issue_id_token,
        }
    }

    /// Decides what `grant` may issue for `scopes`.
    ///
    /// - authorization_code, device_code: nothing without `openid`; with it an
    ///   access token, plus a refresh token for `offline_access` and an ID
    ///   token if enabled
    /// - client_credentials, refresh_token: an access token only
    #[must_use]
    pub fn plan(&self, grant: GrantType, scopes: &Scopes) -> IssuancePlan {
        match grant {
            GrantType::AuthorizationCode | GrantType::DeviceCode => {
                if !scopes.contains(OPENID) {
                    return IssuancePlan::none();
                }
                IssuancePlan {
                    access_token: true,
                    refresh_token: scopes.contains(OFFLINE_ACCESS),
                    id_token: self.issue_id_token,
                }
            }
            GrantType::ClientCredentials | GrantType::RefreshToken => IssuancePlan::access_only(),
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_token_lifetime(&self) -> Duration {
        self.access_token_lifetime
    }

    /// Refresh token lifetime.
    #[must_use]
    pub fn refresh_token_lifetime(&self) -> Duration {
        self.refresh_token_lifetime
    }

    /// ID token lifetime.
    #[must_use]
    pub fn id_token_lifetime(&self) -> Duration {
        self.id_token_lifetime
    }

    /// The `expires_in` value reported for access tokens.
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.access_token_lifetime.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openid_yields_access_token_only() {
        let policy = ScopePolicy::default();
        let plan = policy.plan(GrantType::AuthorizationCode, &Scopes::parse("openid"));
        assert_eq!(plan, IssuancePlan::access_only());
        assert_eq!(policy.expires_in(), 3600);
    }

    #[test]
    fn test_offline_access_adds_refresh_token() {
        let policy = ScopePolicy::default();
        let plan = policy.plan(
            GrantType::AuthorizationCode,
            &Scopes::parse("openid offline_access"),
        );
        assert!(plan.access_token);
        assert!(plan.refresh_token);
        assert!(!plan.id_token);
    }

    #[test]
    fn test_offline_access_without_openid_issues_nothing() {
        let policy = ScopePolicy::default();
        let plan = policy.plan(GrantType::DeviceCode, &Scopes::parse("offline_access profile"));
        assert!(plan.is_empty());
        assert!(!plan.refresh_token);
    }

    #[test]
    fn test_id_token_follows_config() {
        let config = OAuthConfig {
            issue_id_token: true,
            ..Default::default()
        };
        let policy = ScopePolicy::from_config(&config);
        assert!(policy.plan(GrantType::AuthorizationCode, &Scopes::parse("openid")).id_token);
        assert!(!policy.plan(GrantType::AuthorizationCode, &Scopes::parse("email")).id_token);
    }

    #[test]
    fn test_sibling_grants_issue_access_only() {
        let config = OAuthConfig {
            issue_id_token: true,
            ..Default::default()
        };
        let policy = ScopePolicy::from_config(&config);
        let scopes = Scopes::parse("openid offline_access");
        assert_eq!(
            policy.plan(GrantType::ClientCredentials, &scopes),
            IssuancePlan::access_only()
        );
        assert_eq!(
            policy.plan(GrantType::RefreshToken, &scopes),
            IssuancePlan::access_only()
        );
        assert_eq!(
            policy.plan(GrantType::ClientCredentials, &Scopes::new()),
            IssuancePlan::access_only()
        );
    }

    #[test]
    fn test_expires_in_follows_config() {
        let config = OAuthConfig {
            access_token_lifetime: Duration::from_secs(900),
            ..Default::default()
        };
        assert_eq!(ScopePolicy::from_config(&config).expires_in(), 900);
    }
}
