//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256). Must be set through
    /// `KMEM__AUTH__JWT_SECRET` or a config file.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Minimum username length.
    #[serde(default = "default_username_min")]
    pub username_min_length: usize,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Whether auth cookies carry the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            username_min_length: default_username_min(),
            password_min_length: default_password_min(),
            secure_cookies: true,
        }
    }
}

fn default_access_ttl() -> u64 {
    20
}

fn default_refresh_ttl() -> u64 {
    24 * 7
}

fn default_username_min() -> usize {
    4
}

fn default_password_min() -> usize {
    8
}

fn default_true() -> bool {
    true
}
