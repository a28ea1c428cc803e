//! Service-to-service endpoints, guarded by `x-internal-secret`

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;

use super::super::state::AppState;
use super::super::types::{AccountView, ApiError, ApiJson, ApiResult, created};
use crate::webhook::verify_shared_secret;

pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

#[derive(Debug, Deserialize)]
pub struct OpenAccountBody {
    pub owner_id: String,
}

/// Provision the account of a newly onboarded owner
///
/// POST /internal/accounts
pub async fn open_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<OpenAccountBody>,
) -> ApiResult<AccountView> {
    let provided = headers
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    verify_shared_secret(provided, state.secrets.internal_secret.as_deref()).map_err(|e| {
        tracing::warn!(error = %e, "Internal endpoint authentication failed");
        ApiError::from(e)
    })?;

    let owner_id = req.owner_id.trim();
    if owner_id.is_empty() {
        return ApiError::bad_request("owner_id is required").into_err();
    }

    let account = state.store.open_account(owner_id).await?;
    tracing::info!(
        account_id = account.id,
        account_number = %account.account_number,
        "Account opened"
    );
    created(AccountView::from(account))
}
