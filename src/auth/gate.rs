use tracing::warn;

use crate::server::AppState;
use crate::types::Identity;

/// Combines the three admin sources into a single verdict.
///
/// Union semantics: any source that affirmatively says "admin" grants
/// access. A source that could not be consulted reports `None` and is
/// treated as not granting, so a failing source can never widen access.
#[must_use]
pub fn admin_union(
    env_list: Option<bool>,
    allowlist: Option<bool>,
    profile_flag: Option<bool>,
) -> bool {
    env_list.unwrap_or(false) || allowlist.unwrap_or(false) || profile_flag.unwrap_or(false)
}

/// Checks whether the identity is an admin, consulting the cache first and
/// the three sources on a miss. Source failures are logged and degraded to
/// `None` rather than failing the request.
#[must_use]
pub fn resolve_admin(state: &AppState, identity: &Identity) -> bool {
    if identity.dev_bypass {
        return true;
    }

    let email = identity.email.trim().to_lowercase();
    if let Some(cached) = state.admin_cache.get(&email) {
        return cached;
    }

    let env_list = Some(state.admin_emails.iter().any(|a| a == &email));
    let allowlist = match state.store.is_admin_email(&email) {
        Ok(found) => Some(found),
        Err(e) => {
            warn!("admin allowlist lookup failed for {email}: {e}");
            None
        }
    };
    let profile_flag = match state.store.is_profile_admin(&email) {
        Ok(flag) => Some(flag),
        Err(e) => {
            warn!("profile admin lookup failed for {email}: {e}");
            None
        }
    };

    let verdict = admin_union(env_list, allowlist, profile_flag);
    state.admin_cache.insert(&email, verdict);
    verdict
}
