use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who the caller is, as resolved from a bearer token by the external
/// identity provider (or, in development builds, by the dev bypass).
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    /// True only when the identity came from the compiled-in dev bypass.
    #[serde(skip)]
    pub dev_bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub prompt: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeAsset {
    pub id: String,
    /// Path inside the knowledge object store; unique, content-addressed.
    pub object_path: String,
    pub filename: String,
    pub asset_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    pub training_tagged: bool,
    pub created_at: DateTime<Utc>,
}

/// A single parsed JSONL line from a knowledge source. Constructed
/// per-request from raw source bytes, never persisted back.
///
/// The lenient sampling path accepts the field spellings found across the
/// corpus (`user_prompt`/`prompt`/`input_prompt`, `generated_code`/
/// `openscad_code`); the strict upload gate requires `input_prompt` and
/// `generated_code` specifically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeExample {
    #[serde(alias = "user_prompt", alias = "input_prompt")]
    pub prompt: String,
    #[serde(alias = "generated_code", alias = "openscad_code")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

/// Coarse provenance for a knowledge source, used for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    CuratedFeedback,
    TrainingAsset,
    AdminUpload,
}

impl SourceTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::CuratedFeedback => "curated-feedback",
            SourceTag::TrainingAsset => "training-asset",
            SourceTag::AdminUpload => "admin-upload",
        }
    }
}

/// One knowledge source to sample from: a path in the object store plus its
/// provenance tag.
#[derive(Debug, Clone)]
pub struct KnowledgeSource {
    pub path: String,
    pub tag: SourceTag,
}

/// Records which source contributed how many bytes to a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    pub path: String,
    pub bytes_used: usize,
    pub source_tag: SourceTag,
}
