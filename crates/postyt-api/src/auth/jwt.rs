//! HS256 bearer token verification

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use postyt_core::AppError;

use crate::auth::models::{AuthUser, JwtClaims};

#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT verification failed");
            AppError::Forbidden("Invalid or expired token".to_string())
        })?;

        let user_id = data
            .claims
            .subject()
            .ok_or_else(|| AppError::Forbidden("Token carries no user id".to_string()))?;

        Ok(AuthUser { user_id })
    }
}
