//! # FlexiCAD
//!
//! A server for LLM-assisted parametric OpenSCAD design generation, usable
//! both as a standalone binary and as a library.
//!
//! Identity verification and code generation are delegated to external HTTP
//! services; everything else (admin authorization, the curated knowledge
//! corpus, saved designs) lives in an embedded SQLite database plus a local
//! object store under the data directory.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! flexicad = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flexicad::config::ServerConfig;
//! use flexicad::server::{AppState, create_router};
//! use flexicad::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI for the server binary. Disable with
//!   `default-features = false`.
//! - `dev-bypass`: Compiles in a development-only auth bypass token. Never
//!   enable for production builds.

pub mod auth;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod server;
pub mod storage;
pub mod store;
pub mod types;
