use std::sync::Arc;

use axum::{Json, extract::State};

use crate::auth::{RequireAuth, resolve_admin};
use crate::server::AppState;
use crate::server::dto::MeResponse;
use crate::server::response::ApiResponse;

pub async fn get_me(
    RequireAuth(identity): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<MeResponse>> {
    let is_admin = resolve_admin(&state, &identity);
    Json(ApiResponse::success(MeResponse {
        id: identity.id,
        email: identity.email,
        is_admin,
    }))
}
