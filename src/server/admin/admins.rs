use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{
    AddAdminRequest, AdminListResponse, AdminMutationResponse, SessionResponse,
};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_email;

/// Cheap "am I still an admin here" ping for admin tooling.
pub async fn session(RequireAdmin(admin): RequireAdmin) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::success(SessionResponse {
        requester_id: admin.id,
        requester_email: admin.email,
    }))
}

pub async fn list_admins(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let allowlist = state
        .store
        .list_admin_emails()
        .api_err("Failed to list admin emails")?;
    let profiles = state
        .store
        .list_admin_profiles()
        .api_err("Failed to list admin profiles")?
        .into_iter()
        .map(|p| p.email)
        .collect();

    Ok(Json(ApiResponse::success(AdminListResponse {
        env: state.admin_emails.clone(),
        allowlist,
        profiles,
    })))
}

pub async fn add_admin(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&req.email)?;

    let changed = state
        .store
        .add_admin_email(&email, Some(&admin.email))
        .api_err("Failed to add admin email")?;
    state.admin_cache.invalidate(&email);

    info!("admin allowlist add {email} by {} (changed: {changed})", admin.email);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AdminMutationResponse {
            email,
            changed,
        })),
    ))
}

pub async fn remove_admin(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&email)?;

    let changed = state
        .store
        .remove_admin_email(&email)
        .api_err("Failed to remove admin email")?;
    state.admin_cache.invalidate(&email);

    info!("admin allowlist remove {email} by {} (changed: {changed})", admin.email);

    Ok(Json(ApiResponse::success(AdminMutationResponse {
        email,
        changed,
    })))
}

pub async fn promote_profile(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    set_profile_flag(&state, &admin.email, &email, true).await
}

pub async fn demote_profile(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    set_profile_flag(&state, &admin.email, &email, false).await
}

async fn set_profile_flag(
    state: &AppState,
    actor: &str,
    email: &str,
    is_admin: bool,
) -> Result<Json<ApiResponse<AdminMutationResponse>>, ApiError> {
    let email = validate_email(email)?;

    let found = state
        .store
        .set_profile_admin(&email, is_admin)
        .api_err("Failed to update profile admin flag")?;
    if !found {
        return Err(ApiError::not_found("No profile with that email"));
    }
    state.admin_cache.invalidate(&email);

    let action = if is_admin { "promote" } else { "demote" };
    info!("profile {action} {email} by {actor}");

    Ok(Json(ApiResponse::success(AdminMutationResponse {
        email,
        changed: true,
    })))
}
