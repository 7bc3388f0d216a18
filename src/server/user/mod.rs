mod designs;
mod generate;
mod me;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me::get_me))
        // Design routes
        .route("/designs", post(designs::create_design))
        .route("/designs", get(designs::list_designs))
        .route("/designs/{id}", get(designs::get_design))
        .route("/designs/{id}", put(designs::update_design))
        .route("/designs/{id}", delete(designs::delete_design))
        // Generation
        .route("/generate", post(generate::generate))
}
