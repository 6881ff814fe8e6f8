//! # kmem-core
//!
//! Core crate for kmem. Contains the configuration schema and loader,
//! the unified error system, and the cache trait shared by the HTTP
//! layer and the background worker.
//!
//! This crate has **no** internal dependencies on other kmem crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
