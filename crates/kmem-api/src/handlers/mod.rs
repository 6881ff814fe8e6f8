//! Request handlers grouped by resource.

pub mod auth;
pub mod files;
pub mod health;
pub mod stats;
