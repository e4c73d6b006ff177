use axum::{extract::State, Json};
use postyt_core::AccountSummary;
use postyt_db::LinkedAccounts;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountsResponse {
    /// Every platform is listed, with an empty array when nothing is linked
    #[schema(value_type = std::collections::HashMap<String, Vec<AccountSummary>>)]
    pub accounts: LinkedAccounts,
}

#[utoipa::path(
    get,
    path = "/api/user/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Linked accounts grouped by platform", body = AccountsResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<AccountsResponse>, HttpAppError> {
    let accounts = state.accounts.list_accounts(&user.user_id).await?;
    Ok(Json(AccountsResponse { accounts }))
}
