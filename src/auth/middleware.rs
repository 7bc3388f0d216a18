use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use super::gate::resolve_admin;
use super::identity::IdentityError;
use crate::server::AppState;
use crate::types::Identity;

/// Extractor that requires a resolvable identity.
pub struct RequireAuth(pub Identity);

/// Extractor that requires a resolvable identity with an admin verdict.
pub struct RequireAdmin(pub Identity);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    NotAdmin,
    ConfigMissing,
    Upstream(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "auth_required",
                "Authentication required".to_string(),
            ),
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "auth_invalid",
                "Invalid authorization scheme".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "auth_invalid",
                "Invalid token".to_string(),
            ),
            AuthError::NotAdmin => (
                StatusCode::FORBIDDEN,
                "admin_required",
                "Admin access required".to_string(),
            ),
            AuthError::ConfigMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_missing",
                "Identity provider not configured".to_string(),
            ),
            AuthError::Upstream(detail) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("Identity provider unavailable: {detail}"),
            ),
        };

        let body = json!({ "data": null, "error": message, "code": code });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(value) = "Bearer realm=\"flexicad\"".parse() {
                response.headers_mut().insert("WWW-Authenticate", value);
            }
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve_request_identity(parts, state).await?;
        Ok(RequireAuth(identity))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve_request_identity(parts, state).await?;

        if !resolve_admin(state, &identity) {
            warn!("admin access denied for {}", identity.email);
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(identity))
    }
}

async fn resolve_request_identity(
    parts: &mut Parts,
    state: &Arc<AppState>,
) -> Result<Identity, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = extract_bearer_token(auth_header)?.ok_or(AuthError::MissingAuth)?;

    #[cfg(feature = "dev-bypass")]
    if let Some(identity) = super::identity::dev_bypass(
        state.environment,
        state.dev_token.as_deref(),
        &token,
        &state.admin_emails,
    ) {
        warn!("dev bypass token accepted as {}", identity.email);
        return Ok(identity);
    }

    let identity = state.identity.resolve(&token).await.map_err(|e| match e {
        IdentityError::Unconfigured => AuthError::ConfigMissing,
        IdentityError::Rejected => AuthError::InvalidToken,
        IdentityError::Unavailable(detail) => AuthError::Upstream(detail),
    })?;

    // Provision the local profile row on first sight. Failure here is not
    // fatal to the request; the identity itself has already been verified.
    if let Err(e) = state.store.upsert_profile(&identity.id, &identity.email) {
        warn!("failed to provision profile for {}: {e}", identity.email);
    }

    Ok(identity)
}

/// Pulls the bearer token out of an Authorization header value.
///
/// Returns `Ok(None)` when no header was sent, so callers can distinguish
/// "no credentials" from "bad credentials".
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<String>, AuthError> {
    match auth_header {
        None => Ok(None),
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => {
                let token = token.trim();
                if token.is_empty() {
                    Err(AuthError::InvalidToken)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            None => Err(AuthError::InvalidScheme),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(None).unwrap(), None);
        assert_eq!(
            extract_bearer_token(Some("Bearer abc123")).unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_bearer_token(Some("Bearer  padded  ")).unwrap(),
            Some("padded".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_other_schemes() {
        assert!(matches!(
            extract_bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidScheme)
        ));
        assert!(matches!(
            extract_bearer_token(Some("bearer abc")),
            Err(AuthError::InvalidScheme)
        ));
    }

    #[test]
    fn test_extract_rejects_empty_token() {
        assert!(matches!(
            extract_bearer_token(Some("Bearer ")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer    ")),
            Err(AuthError::InvalidToken)
        ));
    }
}
