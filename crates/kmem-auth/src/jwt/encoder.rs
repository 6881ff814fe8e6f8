//! JWT token creation with configurable TTLs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use kmem_core::config::AuthConfig;
use kmem_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Creates signed HS256 access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// A freshly issued access + refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: Duration::hours(config.refresh_ttl_hours as i64),
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issues an access token and a refresh token for `username`.
    pub fn issue_pair(&self, username: &str) -> Result<TokenPair, AppError> {
        let (access_token, access_expires_at) = self.issue(username, TokenType::Access)?;
        let (refresh_token, refresh_expires_at) = self.issue(username, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Issues a standalone access token.
    pub fn issue_access(&self, username: &str) -> Result<(String, DateTime<Utc>), AppError> {
        self.issue(username, TokenType::Access)
    }

    fn issue(&self, username: &str, token_type: TokenType) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = match token_type {
            TokenType::Access => now + self.access_ttl,
            TokenType::Refresh => now + self.refresh_ttl,
        };
        let claims = Claims::new(username, token_type, now, exp);

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode {token_type:?} token: {e}")))?;

        Ok((token, exp))
    }
}
