//! Account linking: authorization URL and provider callback

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use postyt_core::{AppError, PlatformId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// User id passed through the authorization URL
    pub state: Option<String>,
    /// Set by the provider when the user denied access
    pub error: Option<String>,
}

fn parse_platform(raw: &str) -> Result<PlatformId, AppError> {
    raw.parse()
        .map_err(|_| AppError::UnsupportedPlatform(raw.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/auth/{platform}/url",
    tag = "oauth",
    params(("platform" = String, Path, description = "Platform name, e.g. youtube")),
    responses(
        (status = 200, description = "Provider authorization URL", body = AuthUrlResponse),
        (status = 400, description = "Unsupported platform", body = ErrorResponse),
        (status = 500, description = "Platform OAuth client not configured", body = ErrorResponse),
        (status = 501, description = "Platform not yet implemented", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_auth_url(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(platform): Path<String>,
) -> Result<Json<AuthUrlResponse>, HttpAppError> {
    let platform = parse_platform(&platform)?;
    let adapter = state.registry.adapter(platform)?;
    let auth_url = adapter.auth_url(&user.user_id)?;

    tracing::debug!(user_id = %user.user_id, platform = %platform, "Issued authorization URL");

    Ok(Json(AuthUrlResponse { auth_url }))
}

#[utoipa::path(
    get,
    path = "/oauth/{platform}/callback",
    tag = "oauth",
    params(
        ("platform" = String, Path, description = "Platform name"),
        CallbackQuery
    ),
    responses(
        (status = 302, description = "Redirect to the success or error page with ?platform="),
        (status = 400, description = "Unsupported platform", body = ErrorResponse)
    )
)]
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, HttpAppError> {
    let platform = parse_platform(&platform)?;

    let target = match link_account(&state, platform, query).await {
        Ok(()) => state.redirects.success(platform.as_str()),
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "Account linking failed");
            state.redirects.error(platform.as_str())
        }
    };
    Ok(found(target))
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn link_account(
    state: &AppState,
    platform: PlatformId,
    query: CallbackQuery,
) -> Result<(), AppError> {
    if let Some(error) = query.error {
        return Err(AppError::OAuthExchange(format!("provider returned {}", error)));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;
    let user_id = query
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing state".to_string()))?;

    let adapter = state.registry.adapter(platform)?;
    let credential = adapter.handle_callback(&code).await?;

    state
        .accounts
        .upsert_account(&user_id, platform, &credential)
        .await?;

    tracing::info!(
        user_id = %user_id,
        platform = %platform,
        account_id = %credential.account_id,
        "Account linked"
    );
    Ok(())
}
