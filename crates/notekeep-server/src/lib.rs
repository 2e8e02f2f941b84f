//! notekeep-server: HTTP API server for the notekeep backend
//!
//! This crate provides:
//! - REST endpoints for users, notes and note nodes
//! - Bearer access-token authentication and refresh-token sessions
//! - The background sweeper removing expired sessions
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! Handlers stay thin: note and node operations go through the
//! ownership-gated `notekeep_store::Repository`, sessions through
//! `notekeep_store::SessionManager`.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = ServerConfig::from_env()?;
//! let store = Store::connect(StoreConfig::from_env()?).await?;
//! let issuer = TokenIssuer::new(&config.token_config())?;
//! let app = routes::build_router(AppState::new(store, issuer));
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-exports for convenience
pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

// Re-export dependent crates
pub use notekeep_core;
pub use notekeep_store;
