use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crowdfund_types::api::Claims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and validates HS256 bearer tokens bound to a user id.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            exp: (Utc::now() + self.ttl).timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verify signature and expiry, then decode into the typed claim set.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::hours(1))
    }

    #[test]
    fn issued_token_validates_to_same_user() {
        let tokens = service();
        let token = tokens.issue(42).unwrap();
        assert_eq!(tokens.validate(&token).unwrap().user_id, 42);
    }

    #[test]
    fn foreign_signature_rejected() {
        let other = TokenService::new("another-secret", Duration::hours(1));
        let token = other.issue(42).unwrap();
        assert!(service().validate(&token).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(service().validate("not.a.token").is_err());
        assert!(service().validate("").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let expired = TokenService::new("test-secret", Duration::hours(-2));
        let token = expired.issue(42).unwrap();
        assert!(service().validate(&token).is_err());
    }

    #[test]
    fn mistyped_claim_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "user_id": "42", "exp": exp }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(service().validate(&token).is_err());

        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "exp": exp }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(service().validate(&token).is_err());
    }
}
