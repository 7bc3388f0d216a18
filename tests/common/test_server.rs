use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use flexicad::config::{IdentityConfig, LlmConfig, ServerConfig, parse_admin_emails};
use flexicad::server::{AppState, create_router};
use flexicad::store::{SqliteStore, Store};

/// Admin email seeded through the env admin list on every test server.
pub const ENV_ADMIN: &str = "root@flexicad.test";

#[derive(Default)]
struct UpstreamState {
    /// token -> (subject id, email), standing in for the identity provider
    tokens: Mutex<HashMap<String, (String, String)>>,
}

/// An in-process server plus a mock upstream standing in for both the
/// identity provider and the chat-completions backend.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub client: reqwest::Client,
    upstream: Arc<UpstreamState>,
}

async fn upstream_user(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let tokens = state.tokens.lock().unwrap();
    match tokens.get(token) {
        Some((id, email)) => Ok(Json(json!({ "id": id, "email": email }))),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Echoes the system message back inside the completion, so tests can
/// assert which examples made it into the prompt.
async fn upstream_completions(Json(body): Json<Value>) -> Json<Value> {
    let system_content = body["messages"]
        .as_array()
        .and_then(|messages| {
            messages
                .iter()
                .find(|m| m["role"] == "system")
                .and_then(|m| m["content"].as_str())
        })
        .unwrap_or("");

    let content = format!("{system_content}\nmodule generated() {{}}");
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

impl TestServer {
    pub async fn start() -> Self {
        let upstream = Arc::new(UpstreamState::default());
        let upstream_router = Router::new()
            .route("/auth/v1/user", get(upstream_user))
            .route("/v1/chat/completions", post(upstream_completions))
            .with_state(upstream.clone());

        let upstream_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream");
        let upstream_addr = upstream_listener.local_addr().expect("upstream addr");
        tokio::spawn(async move {
            axum::serve(upstream_listener, upstream_router)
                .await
                .expect("serve upstream");
        });

        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            admin_emails: parse_admin_emails(ENV_ADMIN),
            identity: IdentityConfig {
                base_url: format!("http://{upstream_addr}"),
                service_key: None,
            },
            llm: LlmConfig {
                base_url: format!("http://{upstream_addr}"),
                api_key: "test-key".to_string(),
                ..LlmConfig::default()
            },
            // Zero TTL keeps admin mutations immediately visible.
            admin_cache_ttl: Duration::ZERO,
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState::new(Arc::new(store), &config));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind server");
        let addr = listener.local_addr().expect("server addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            upstream,
        }
    }

    /// Registers a fresh bearer token with the mock identity provider.
    pub fn issue_token(&self, email: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let subject = Uuid::new_v4().to_string();
        self.upstream
            .tokens
            .lock()
            .unwrap()
            .insert(token.clone(), (subject, email.to_string()));
        token
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("send request")
    }

    pub async fn post_json(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("send request")
    }

    pub async fn put_json(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("send request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .expect("send request")
    }

    pub async fn upload(
        &self,
        path: &str,
        token: &str,
        filename: &str,
        bytes: Vec<u8>,
        asset_type: Option<&str>,
    ) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );
        if let Some(asset_type) = asset_type {
            form = form.text("asset_type", asset_type.to_string());
        }

        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("send upload")
    }
}
