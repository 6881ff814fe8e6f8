//! CORS layer configuration.

use std::time::Duration;

use axum::http::header::{CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;

use kmem_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Credentials are allowed, so origins are always listed explicitly.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([ORIGIN, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_seconds))
}
