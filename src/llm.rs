//! Client for the upstream chat-completions endpoint that turns an
//! assembled prompt into OpenSCAD source.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generation backend not configured")]
    Unconfigured,
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("generation backend returned no content")]
    EmptyCompletion,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GenerationClient {
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Sends the preamble as the system message and the user's request as
    /// the user message, returning the completion text verbatim.
    pub async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, LlmError> {
        if self.base_url.is_empty() {
            return Err(LlmError::Unconfigured);
        }

        let mut messages = Vec::with_capacity(2);
        if !preamble.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: preamble.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Unavailable(format!("status {status}: {body}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }
}
