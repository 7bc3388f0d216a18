use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::user::user_router;
use crate::auth::{AdminStatusCache, IdentityClient};
use crate::config::{AppEnv, ServerConfig};
use crate::knowledge::SamplerConfig;
use crate::llm::GenerationClient;
use crate::storage::KnowledgeStorage;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub storage: KnowledgeStorage,
    pub identity: IdentityClient,
    pub llm: GenerationClient,
    /// Admin emails from the environment, normalized lowercase at startup.
    pub admin_emails: Vec<String>,
    pub environment: AppEnv,
    #[cfg(feature = "dev-bypass")]
    pub dev_token: Option<String>,
    pub admin_cache: AdminStatusCache,
    pub sampler: SamplerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            store,
            storage: KnowledgeStorage::new(&config.data_dir),
            identity: IdentityClient::new(&config.identity),
            llm: GenerationClient::new(&config.llm),
            admin_emails: config.admin_emails.clone(),
            environment: config.environment,
            #[cfg(feature = "dev-bypass")]
            dev_token: config.dev_token.clone(),
            admin_cache: AdminStatusCache::new(config.admin_cache_ttl),
            sampler: SamplerConfig::default(),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", user_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
