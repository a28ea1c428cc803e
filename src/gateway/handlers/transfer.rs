//! Transfer handlers (internal P2P, outbound bank transfers, bill payments)

use std::sync::Arc;

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::super::extract::CallerAccount;
use super::super::state::AppState;
use super::super::types::{ApiError, ApiJson, ApiResult, TransferView, ok};
use crate::core_types::{AccountId, Amount, TransactionId};
use crate::external::{ExternalTransferError, ExternalTransferRequest};
use crate::ledger::RecordStatus;
use crate::money::{ClientAmount, format_amount};
use crate::transfer::{InternalTransferRequest, TransferError};

#[derive(Debug, Deserialize)]
pub struct TransferRequestBody {
    pub sender_account_id: AccountId,
    pub recipient_account_number: String,
    pub amount: ClientAmount,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponseData {
    pub transaction_id: TransactionId,
    pub transfer_id: String,
    pub reference: String,
    pub status: RecordStatus,
}

/// Internal transfer endpoint
///
/// POST /api/v1/transfer
///
/// Completes synchronously: funds have moved when this returns success.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    ApiJson(req): ApiJson<TransferRequestBody>,
) -> ApiResult<TransferResponseData> {
    if req.sender_account_id != caller {
        tracing::warn!(
            caller,
            sender = req.sender_account_id,
            "Transfer sender does not match caller"
        );
        return ApiError::forbidden("SENDER_MISMATCH", "Sender mismatch").into_err();
    }

    let amount = to_minor(req.amount).ok_or(TransferError::InvalidAmount)?;

    let receipt = state
        .transfers
        .execute(InternalTransferRequest {
            sender_account_id: caller,
            recipient_account_number: req.recipient_account_number,
            amount,
            note: req.note,
        })
        .await
        .map_err(|e| {
            if e.http_status() >= 500 {
                tracing::error!(error = %e, "Transfer failed");
            }
            ApiError::from(e)
        })?;

    ok(TransferResponseData {
        transaction_id: receipt.transaction_id,
        transfer_id: receipt.transfer_id.to_string(),
        reference: receipt.reference,
        status: receipt.status,
    })
}

#[derive(Debug, Deserialize)]
pub struct ExternalTransferBody {
    pub account_number: String,
    pub bank_code: String,
    pub amount: ClientAmount,
    pub recipient_name: String,
    #[serde(default)]
    pub narration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExternalTransferResponseData {
    pub transfer_code: String,
    pub reference: String,
    pub transfer_id: String,
    /// Always `pending`: settlement arrives later by webhook
    pub status: RecordStatus,
}

/// Outbound bank transfer endpoint
///
/// POST /api/v1/external-transfer
pub async fn create_external_transfer(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    ApiJson(req): ApiJson<ExternalTransferBody>,
) -> ApiResult<ExternalTransferResponseData> {
    let amount = to_minor(req.amount).ok_or(ExternalTransferError::InvalidAmount)?;

    let receipt = state
        .external
        .initiate(ExternalTransferRequest {
            sender_account_id: caller,
            account_number: req.account_number,
            bank_code: req.bank_code,
            amount,
            recipient_name: req.recipient_name,
            narration: req.narration,
        })
        .await?;

    ok(ExternalTransferResponseData {
        transfer_code: receipt.transfer_code,
        reference: receipt.reference,
        transfer_id: receipt.transfer_id.to_string(),
        status: receipt.status,
    })
}

/// Get one of the caller's transfers
///
/// GET /api/v1/transfer/{reference}
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    Path(reference): Path<String>,
) -> ApiResult<TransferView> {
    match state.store.get_transfer(&reference).await? {
        Some(t) if t.sender_account_id == caller || t.recipient_account_id == Some(caller) => {
            ok(TransferView::from(t))
        }
        _ => ApiError::not_found("Transfer not found").into_err(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentBody {
    pub amount: ClientAmount,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponseData {
    pub transaction_id: TransactionId,
    pub amount: String,
}

/// Bill payment debit
///
/// POST /api/v1/payment
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    CallerAccount(caller): CallerAccount,
    ApiJson(req): ApiJson<PaymentBody>,
) -> ApiResult<PaymentResponseData> {
    let amount = to_minor(req.amount).ok_or(TransferError::InvalidAmount)?;
    let receipt = state
        .transfers
        .record_payment(caller, amount, &req.description)
        .await?;

    ok(PaymentResponseData {
        transaction_id: receipt.transaction_id,
        amount: format_amount(receipt.amount),
    })
}

/// Client amount to minor units; `None` when it has sub-kobo precision or overflows
fn to_minor(amount: ClientAmount) -> Option<Amount> {
    amount.to_minor_units().ok()
}
