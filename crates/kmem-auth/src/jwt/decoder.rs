//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use kmem_core::config::AuthConfig;
use kmem_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates JWT tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // clock skew
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Access)
    }

    /// Decodes and validates a refresh token string.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Refresh)
    }

    fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != expected {
            return Err(AppError::authentication(format!(
                "Invalid token type: expected {expected:?} token"
            )));
        }

        Ok(claims)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    use kmem_core::error::ErrorKind;

    use super::*;
    use crate::jwt::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pair_round_trip() {
        let cfg = config("s3cret");
        let pair = JwtEncoder::new(&cfg).issue_pair("alice").unwrap();
        let decoder = JwtDecoder::new(&cfg);

        let access = decoder.decode_access(&pair.access_token).unwrap();
        assert_eq!(access.username(), "alice");
        assert_eq!(access.token_type, TokenType::Access);
        assert!(pair.refresh_expires_at - pair.access_expires_at > Duration::hours(160));

        let refresh = decoder.decode_refresh(&pair.refresh_token).unwrap();
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let cfg = config("s3cret");
        let pair = JwtEncoder::new(&cfg).issue_pair("alice").unwrap();
        let decoder = JwtDecoder::new(&cfg);

        assert!(decoder.decode_access(&pair.refresh_token).unwrap_err().is(ErrorKind::Authentication));
        assert!(decoder.decode_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (token, _) = JwtEncoder::new(&config("one")).issue_access("alice").unwrap();
        let err = JwtDecoder::new(&config("two")).decode_access(&token).unwrap_err();
        assert!(err.is(ErrorKind::Authentication));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims::new(
            "alice",
            TokenType::Access,
            now - Duration::hours(1),
            now - Duration::minutes(1),
        );
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();

        let err = JwtDecoder::new(&config("k")).decode_access(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(JwtDecoder::new(&config("k")).decode_access("not.a.jwt").is_err());
    }
}
