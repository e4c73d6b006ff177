use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use postyt_core::AppError;
use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::error::HttpAppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

/// Bearer authentication: a missing header is 401, a bad or expired token is 403
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => header.strip_prefix("Bearer ").map(str::trim),
        None => {
            return HttpAppError(AppError::Unauthorized("Access token required".to_string()))
                .into_response();
        }
    };

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return HttpAppError(AppError::Forbidden(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match auth_state.jwt.verify(token) {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
