mod admins;
mod assets;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(admins::session))
        // Admin source routes
        .route("/admins", get(admins::list_admins))
        .route("/admins", post(admins::add_admin))
        .route("/admins/{email}", delete(admins::remove_admin))
        .route("/admins/{email}/promote", post(admins::promote_profile))
        .route("/admins/{email}/demote", post(admins::demote_profile))
        // Knowledge asset routes
        .route("/assets", post(assets::upload_asset))
        .route("/assets", get(assets::list_assets))
        .route("/assets/{id}", get(assets::get_asset))
        .route("/assets/{id}/training", post(assets::set_training))
        .route("/curated", post(assets::upload_curated))
}
