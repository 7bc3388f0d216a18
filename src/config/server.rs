use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Deployment environment. Anything that is not explicitly "development"
/// is treated as production; the dev auth bypass keys off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    Development,
    #[default]
    Production,
}

impl AppEnv {
    /// Only the exact word "development" (case-insensitive) selects the
    /// development environment. Unknown values fall back to production so a
    /// typo can never widen access.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            AppEnv::Development
        } else {
            AppEnv::Production
        }
    }
}

/// External identity provider reachable over HTTP. Token verification is
/// fully delegated; this server never issues or stores credentials.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    pub base_url: String,
    pub service_key: Option<String>,
}

/// External chat-completions provider used for OpenSCAD code generation.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Immutable per-process configuration, assembled once at startup. The env
/// admin list in particular is parsed here exactly once, never per request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub environment: AppEnv,
    /// Deploy-time admin emails, lowercased. Changing this requires a
    /// restart by design.
    pub admin_emails: Vec<String>,
    pub identity: IdentityConfig,
    pub llm: LlmConfig,
    /// Development bypass token. Only consulted by builds with the
    /// `dev-bypass` feature, and only when `environment` is development.
    pub dev_token: Option<String>,
    pub admin_cache_ttl: Duration,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("flexicad.db")
    }

    /// Fills the provider and admin settings from environment variables.
    /// The identity and LLM base URLs are required; refusing to start beats
    /// serving 500s later.
    pub fn load_env(mut self) -> Result<Self> {
        self.environment = AppEnv::parse(&env_or_default("FLEXICAD_ENV", ""));
        self.admin_emails = parse_admin_emails(&env_or_default("FLEXICAD_ADMIN_EMAILS", ""));

        self.identity.base_url = require_env("FLEXICAD_IDENTITY_URL")?;
        self.identity.service_key = std::env::var("FLEXICAD_IDENTITY_KEY").ok();

        self.llm.base_url = require_env("FLEXICAD_LLM_URL")?;
        self.llm.api_key = require_env("FLEXICAD_LLM_KEY")?;
        if let Ok(model) = std::env::var("FLEXICAD_LLM_MODEL") {
            self.llm.model = model;
        }

        self.dev_token = std::env::var("FLEXICAD_DEV_TOKEN").ok();

        Ok(self)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            environment: AppEnv::Production,
            admin_emails: Vec::new(),
            identity: IdentityConfig::default(),
            llm: LlmConfig::default(),
            dev_token: None,
            admin_cache_ttl: Duration::from_secs(30),
        }
    }
}

/// Parses a comma-separated admin email list: entries are trimmed and
/// lowercased, empties dropped.
#[must_use]
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!("{key} must be set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_env_parse() {
        assert_eq!(AppEnv::parse("development"), AppEnv::Development);
        assert_eq!(AppEnv::parse(" Development "), AppEnv::Development);
        assert_eq!(AppEnv::parse("production"), AppEnv::Production);
        assert_eq!(AppEnv::parse("dev"), AppEnv::Production);
        assert_eq!(AppEnv::parse(""), AppEnv::Production);
    }

    #[test]
    fn test_parse_admin_emails() {
        let emails = parse_admin_emails(" Admin@Example.com, ,other@example.com,");
        assert_eq!(emails, vec!["admin@example.com", "other@example.com"]);
        assert!(parse_admin_emails("").is_empty());
    }
}
