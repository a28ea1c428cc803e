//! Deposit handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use serde::Deserialize;

use super::super::extract::CallerAccount;
use super::super::state::AppState;
use super::super::types::{ApiError, ApiJson, ApiResult, DepositView, ok};
use crate::deposit::{DepositError, DepositInitiated};
use crate::ledger::DepositMethod;
use crate::money::ClientAmount;

#[derive(Debug, Deserialize)]
pub struct DepositRequestBody {
    pub amount: ClientAmount,
    pub method: String,
}

/// Initiate a deposit
///
/// POST /api/v1/deposit
///
/// Returns the reference and method-specific payment instructions. The
/// deposit stays pending until the gateway calls back.
pub async fn create_deposit(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    ApiJson(req): ApiJson<DepositRequestBody>,
) -> ApiResult<DepositInitiated> {
    let method: DepositMethod = req
        .method
        .parse()
        .map_err(|_| DepositError::UnsupportedMethod(req.method.clone()))?;
    let amount = req
        .amount
        .to_minor_units()
        .map_err(|_| DepositError::InvalidAmount)?;

    let initiated = state
        .deposits
        .initiate(caller, amount, method)
        .await
        .map_err(|e| {
            if e.http_status() >= 500 {
                tracing::error!(account_id = caller, error = %e, "Deposit initiation failed");
            }
            ApiError::from(e)
        })?;
    ok(initiated)
}

/// GET /api/v1/deposit/{reference}
pub async fn get_deposit(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    Path(reference): Path<String>,
) -> ApiResult<DepositView> {
    match state.store.get_deposit(&reference).await? {
        Some(d) if d.account_id == caller => ok(DepositView::from(d)),
        _ => ApiError::not_found("Deposit not found").into_err(),
    }
}
