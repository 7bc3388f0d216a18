use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{CreateDesignRequest, UpdateDesignRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_design_name, validate_prompt};
use crate::types::Design;

pub async fn create_design(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDesignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_design_name(&req.name)?;
    validate_prompt(&req.prompt)?;

    let now = Utc::now();
    let design = Design {
        id: Uuid::new_v4().to_string(),
        owner_id: identity.id,
        name: req.name,
        prompt: req.prompt,
        code: req.code,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_design(&design)
        .api_err("Failed to create design")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(design))))
}

pub async fn list_designs(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let designs = state
        .store
        .list_designs(&identity.id)
        .api_err("Failed to list designs")?;
    Ok(Json(ApiResponse::success(designs)))
}

pub async fn get_design(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let design = fetch_owned(&state, &id, &identity.id)?;
    Ok(Json(ApiResponse::success(design)))
}

pub async fn update_design(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDesignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut design = fetch_owned(&state, &id, &identity.id)?;

    if let Some(name) = req.name {
        validate_design_name(&name)?;
        design.name = name;
    }
    if let Some(prompt) = req.prompt {
        validate_prompt(&prompt)?;
        design.prompt = prompt;
    }
    if let Some(code) = req.code {
        design.code = code;
    }
    design.updated_at = Utc::now();

    state
        .store
        .update_design(&design)
        .api_err("Failed to update design")?;

    Ok(Json(ApiResponse::success(design)))
}

pub async fn delete_design(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_design(&id, &identity.id)
        .api_err("Failed to delete design")?;
    if !deleted {
        return Err(ApiError::not_found("Design not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Fetches a design and checks ownership. A design owned by someone else
/// is reported as not found, not forbidden.
fn fetch_owned(state: &AppState, id: &str, owner_id: &str) -> Result<Design, ApiError> {
    let design = state
        .store
        .get_design(id)
        .api_err("Failed to fetch design")?
        .ok_or_else(|| ApiError::not_found("Design not found"))?;
    if design.owner_id != owner_id {
        return Err(ApiError::not_found("Design not found"));
    }
    Ok(design)
}
