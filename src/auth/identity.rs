use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::IdentityConfig;
use crate::types::Identity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider not configured")]
    Unconfigured,
    #[error("token rejected by identity provider")]
    Rejected,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: Option<String>,
}

/// Thin client for the external identity provider. Token verification is
/// fully delegated: we hand over the bearer token, the provider hands back
/// the subject it belongs to (or a rejection).
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    service_key: Option<String>,
}

impl IdentityClient {
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        }
    }

    pub async fn resolve(&self, bearer: &str) -> Result<Identity, IdentityError> {
        if self.base_url.is_empty() {
            return Err(IdentityError::Unconfigured);
        }

        let mut request = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(bearer);
        if let Some(key) = &self.service_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let user: ProviderUser = response
                .json()
                .await
                .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

            // A subject without an email cannot be matched against any
            // admin source; treat it as unresolvable.
            let email = user
                .email
                .filter(|e| !e.trim().is_empty())
                .ok_or(IdentityError::Rejected)?;

            Ok(Identity {
                id: user.id,
                email,
                dev_bypass: false,
            })
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(IdentityError::Rejected)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(IdentityError::Unavailable(format!("status {status}: {body}")))
        }
    }
}

/// Development-only bypass: a synthetic identity for the configured dev
/// token. Exists only in `dev-bypass` builds, and even there refuses to
/// activate unless the runtime environment is explicitly development.
#[cfg(feature = "dev-bypass")]
pub fn dev_bypass(
    environment: crate::config::AppEnv,
    configured: Option<&str>,
    presented: &str,
    admin_emails: &[String],
) -> Option<Identity> {
    if environment != crate::config::AppEnv::Development {
        return None;
    }
    let configured = configured?.trim();
    if configured.is_empty() || presented != configured {
        return None;
    }

    let email = admin_emails
        .first()
        .cloned()
        .unwrap_or_else(|| "dev@flexicad.local".to_string());

    Some(Identity {
        id: "00000000-0000-0000-0000-000000000000".to_string(),
        email,
        dev_bypass: true,
    })
}

#[cfg(all(test, feature = "dev-bypass"))]
mod dev_bypass_tests {
    use super::*;
    use crate::config::AppEnv;

    #[test]
    fn test_bypass_matches_in_development() {
        let identity = dev_bypass(
            AppEnv::Development,
            Some("local-token"),
            "local-token",
            &["admin@example.com".to_string()],
        )
        .unwrap();
        assert!(identity.dev_bypass);
        assert_eq!(identity.email, "admin@example.com");
    }

    #[test]
    fn test_bypass_never_activates_in_production() {
        // Even a perfectly matching token must not resolve outside of the
        // development environment.
        assert!(dev_bypass(AppEnv::Production, Some("local-token"), "local-token", &[]).is_none());
    }

    #[test]
    fn test_bypass_requires_exact_match_and_configured_token() {
        assert!(dev_bypass(AppEnv::Development, Some("local-token"), "other", &[]).is_none());
        assert!(dev_bypass(AppEnv::Development, Some(""), "", &[]).is_none());
        assert!(dev_bypass(AppEnv::Development, None, "anything", &[]).is_none());
    }

    #[test]
    fn test_bypass_falls_back_to_placeholder_email() {
        let identity = dev_bypass(AppEnv::Development, Some("t"), "t", &[]).unwrap();
        assert_eq!(identity.email, "dev@flexicad.local");
    }
}
