mod server;

pub use server::{AppEnv, IdentityConfig, LlmConfig, ServerConfig, parse_admin_emails};
