use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::knowledge::validate_jsonl;
use crate::server::AppState;
use crate::server::dto::{CuratedUploadResponse, SetTrainingRequest, UploadAssetResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::storage::CURATED_GLOBAL_PATH;
use crate::types::KnowledgeAsset;

const DEFAULT_ASSET_TYPE: &str = "admin-upload";

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<(UploadedFile, String), ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut asset_type = DEFAULT_ASSET_TYPE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.jsonl").to_string();
                let content_type = field.content_type().map(ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read uploaded file"))?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            Some("asset_type") => {
                asset_type = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read asset_type field"))?
                    .trim()
                    .to_lowercase();
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    if file.data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    Ok((file, asset_type))
}

pub async fn upload_asset(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (file, asset_type) = read_upload(&mut multipart).await?;

    // JSONL content goes through the strict gate before it can enter the
    // corpus; other file types are stored as-is.
    let is_jsonl = asset_type == "training" || file.filename.to_lowercase().ends_with(".jsonl");
    let validated_lines = if is_jsonl {
        match validate_jsonl(&file.data) {
            Ok(lines) => Some(lines),
            Err(rejection) => return Err(ApiError::invalid_jsonl(&rejection)),
        }
    } else {
        None
    };

    let object_path = state
        .storage
        .put(&file.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store asset: {e}")))?;

    let asset = KnowledgeAsset {
        id: Uuid::new_v4().to_string(),
        object_path,
        filename: file.filename,
        asset_type: asset_type.clone(),
        size_bytes: file.data.len() as i64,
        content_type: file.content_type,
        uploaded_by: Some(admin.email.clone()),
        training_tagged: asset_type == "training",
        created_at: Utc::now(),
    };

    let stored = state
        .store
        .upsert_knowledge_asset(&asset)
        .api_err("Failed to register asset")?;

    info!(
        "knowledge asset {} ({}) uploaded by {} ({} bytes)",
        stored.id, stored.filename, admin.email, stored.size_bytes
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadAssetResponse {
            asset: stored,
            validated_lines,
        })),
    ))
}

/// Replaces the global curated feedback file. Always JSONL, always
/// strictly validated.
pub async fn upload_curated(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (file, _) = read_upload(&mut multipart).await?;

    let validated_lines = match validate_jsonl(&file.data) {
        Ok(lines) => lines,
        Err(rejection) => return Err(ApiError::invalid_jsonl(&rejection)),
    };

    state
        .storage
        .put_curated(&file.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store curated file: {e}")))?;

    info!(
        "curated knowledge replaced by {} ({} bytes, {validated_lines} lines)",
        admin.email,
        file.data.len()
    );

    Ok(Json(ApiResponse::success(CuratedUploadResponse {
        path: CURATED_GLOBAL_PATH.to_string(),
        validated_lines,
    })))
}

pub async fn list_assets(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let assets = state
        .store
        .list_knowledge_assets()
        .api_err("Failed to list assets")?;
    Ok(Json(ApiResponse::success(assets)))
}

pub async fn get_asset(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state
        .store
        .get_knowledge_asset(&id)
        .api_err("Failed to fetch asset")?
        .or_not_found("Asset not found")?;
    Ok(Json(ApiResponse::success(asset)))
}

pub async fn set_training(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetTrainingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .store
        .set_asset_training(&id, req.tagged)
        .api_err("Failed to update training tag")?;
    if !found {
        return Err(ApiError::not_found("Asset not found"));
    }

    info!("asset {id} training tag set to {} by {}", req.tagged, admin.email);

    let asset = state
        .store
        .get_knowledge_asset(&id)
        .api_err("Failed to fetch asset")?
        .or_not_found("Asset not found")?;
    Ok(Json(ApiResponse::success(asset)))
}
