use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::knowledge::{build, render_preamble};
use crate::llm::LlmError;
use crate::server::AppState;
use crate::server::dto::{GenerateRequest, GenerateResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_design_name, validate_prompt};
use crate::storage::CURATED_GLOBAL_PATH;
use crate::types::{Design, KnowledgeSource, SourceTag};

pub async fn generate(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_prompt(&req.prompt)?;
    if let Some(name) = &req.save_as {
        validate_design_name(name)?;
    }

    // Curated feedback first, then the most recent training-tagged assets.
    let mut sources = Vec::new();
    if state.storage.exists(CURATED_GLOBAL_PATH).await {
        sources.push(KnowledgeSource {
            path: CURATED_GLOBAL_PATH.to_string(),
            tag: SourceTag::CuratedFeedback,
        });
    }
    let assets = state
        .store
        .list_training_assets(state.sampler.max_asset_sources as i64)
        .api_err("Failed to list training assets")?;
    for asset in assets {
        sources.push(KnowledgeSource {
            path: asset.object_path,
            tag: SourceTag::TrainingAsset,
        });
    }

    let sample = build(&state.storage, &req.prompt, &sources, &state.sampler).await;

    for entry in &sample.provenance {
        info!(
            "generation for {} sampled {} ({} bytes, {})",
            identity.email,
            entry.path,
            entry.bytes_used,
            entry.source_tag.as_str()
        );
    }

    let preamble = render_preamble(&sample.examples);
    let code = state
        .llm
        .generate(&preamble, req.prompt.trim())
        .await
        .map_err(|e| match e {
            LlmError::Unconfigured => {
                ApiError::config_missing("Generation backend not configured")
            }
            LlmError::Unavailable(detail) => {
                ApiError::bad_gateway(format!("Generation backend unavailable: {detail}"))
            }
            LlmError::EmptyCompletion => {
                ApiError::bad_gateway("Generation backend returned no content")
            }
        })?;

    let design = match req.save_as {
        Some(name) => {
            let now = Utc::now();
            let design = Design {
                id: Uuid::new_v4().to_string(),
                owner_id: identity.id.clone(),
                name,
                prompt: req.prompt.clone(),
                code: code.clone(),
                created_at: now,
                updated_at: now,
            };
            state
                .store
                .create_design(&design)
                .api_err("Failed to save design")?;
            Some(design)
        }
        None => None,
    };

    Ok(Json(ApiResponse::success(GenerateResponse {
        code,
        examples_used: sample.examples.len(),
        provenance: sample.provenance,
        design,
    })))
}
