use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use postyt_core::AppError;
use serde::{Deserialize, Serialize};

use crate::error::HttpAppError;

/// JWT claims issued by the identity service
///
/// The user id is read from `userId`, falling back to the standard `sub` claim. Ids may be
/// strings or numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl JwtClaims {
    pub fn subject(&self) -> Option<String> {
        self.user_id
            .as_ref()
            .and_then(id_string)
            .or_else(|| self.sub.as_ref().and_then(id_string))
    }
}

/// Authenticated caller, stored in request extensions by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

// Extracted from parts directly so it composes with `Multipart`
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Access token required".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: serde_json::Value) -> JwtClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_subject_prefers_user_id() {
        let c = claims(json!({"userId": "u-1", "sub": "other"}));
        assert_eq!(c.subject().as_deref(), Some("u-1"));
    }

    #[test]
    fn test_subject_falls_back_to_sub() {
        let c = claims(json!({"sub": "u-2"}));
        assert_eq!(c.subject().as_deref(), Some("u-2"));
    }

    #[test]
    fn test_numeric_user_id() {
        let c = claims(json!({"userId": 42}));
        assert_eq!(c.subject().as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_subject() {
        assert!(claims(json!({"userId": ""})).subject().is_none());
        assert!(claims(json!({})).subject().is_none());
    }
}
