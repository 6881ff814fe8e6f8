//! # kmem-api
//!
//! HTTP API layer for kmem built on Axum.
//!
//! Provides the REST endpoints, the cookie authentication middleware,
//! extractors, DTOs, and error mapping.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
