//! Account handlers (balance, history)

use std::sync::Arc;

use axum::extract::{Query, State};
use serde::Deserialize;

use super::super::extract::CallerAccount;
use super::super::state::AppState;
use super::super::types::{
    AccountView, ApiError, ApiResult, TransactionList, TransactionView, TransferList,
    TransferView, ok,
};

const DEFAULT_PAGE: usize = 50;
const MAX_PAGE: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
}

impl PageParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
    }
}

/// GET /api/v1/account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
) -> ApiResult<AccountView> {
    match state.store.get_account(caller).await? {
        Some(account) => ok(AccountView::from(account)),
        None => ApiError::not_found("Account not found").into_err(),
    }
}

/// Audit trail, newest first
///
/// GET /api/v1/account/transactions?limit=50
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    Query(params): Query<PageParams>,
) -> ApiResult<TransactionList> {
    let rows = state
        .store
        .list_transactions(caller, params.limit())
        .await?;
    ok(TransactionList {
        transactions: rows.into_iter().map(TransactionView::from).collect(),
    })
}

/// Transfers sent by the caller, newest first
///
/// GET /api/v1/account/transfers?limit=50
pub async fn get_transfers(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    Query(params): Query<PageParams>,
) -> ApiResult<TransferList> {
    let rows = state.store.list_transfers(caller, params.limit()).await?;
    ok(TransferList {
        transfers: rows.into_iter().map(TransferView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(PageParams { limit: None }.limit(), 50);
        assert_eq!(PageParams { limit: Some(0) }.limit(), 1);
        assert_eq!(PageParams { limit: Some(10_000) }.limit(), 200);
    }
}
