//! JWT claims carried by access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id.
    pub jti: Uuid,
    /// Token type: "access" or "refresh".
    pub token_type: TokenType,
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token accepted on API requests.
    Access,
    /// Long-lived token that renews the access token.
    Refresh,
}

impl Claims {
    pub(crate) fn new(username: &str, token_type: TokenType, issued: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self {
            sub: username.to_string(),
            iat: issued.timestamp(),
            exp: expires.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    /// The username the token was issued to.
    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
