//! HTTP server
//!
//! Exposes the session registry's control and delivery operations over
//! HTTP with axum.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::{parse_bind_addr, ServerConfig, DEFAULT_PORT};
pub use listener::HttpServer;
pub use routes::{router, ApiError, StartRequest};
