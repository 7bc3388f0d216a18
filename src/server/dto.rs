use serde::{Deserialize, Serialize};

use crate::types::{Design, KnowledgeAsset, Provenance};

#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    pub email: String,
}

/// Result of an idempotent admin mutation: `changed` is false when the
/// operation was already in effect.
#[derive(Debug, Serialize)]
pub struct AdminMutationResponse {
    pub email: String,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminListResponse {
    pub env: Vec<String>,
    pub allowlist: Vec<String>,
    pub profiles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub requester_id: String,
    pub requester_email: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateDesignRequest {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDesignRequest {
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// When set, the generated code is also saved as a design by this name.
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub code: String,
    pub examples_used: usize,
    pub provenance: Vec<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<Design>,
}

#[derive(Debug, Serialize)]
pub struct UploadAssetResponse {
    pub asset: KnowledgeAsset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_lines: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CuratedUploadResponse {
    pub path: String,
    pub validated_lines: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetTrainingRequest {
    pub tagged: bool,
}
