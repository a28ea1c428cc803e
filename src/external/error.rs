//! External Transfer Error Types

use thiserror::Error;

use super::gateway::GatewayError;
use crate::core_types::AccountId;
use crate::ledger::LedgerError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalTransferError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Account Errors ===
    #[error("Sender account not found: {0}")]
    SenderNotFound(AccountId),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    // === Gateway Errors ===
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Gateway rejected transfer: {0}")]
    GatewayRejected(String),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    // === System Errors ===
    #[error("Ledger busy, retries exhausted")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ExternalTransferError {
    pub fn code(&self) -> &'static str {
        match self {
            ExternalTransferError::InvalidAmount => "INVALID_AMOUNT",
            ExternalTransferError::InvalidRequest(_) => "INVALID_REQUEST",
            ExternalTransferError::SenderNotFound(_) => "SENDER_NOT_FOUND",
            ExternalTransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ExternalTransferError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            ExternalTransferError::InvalidRecipient(_) => "INVALID_RECIPIENT",
            ExternalTransferError::GatewayRejected(_) => "GATEWAY_REJECTED",
            ExternalTransferError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            ExternalTransferError::Conflict => "CONFLICT",
            ExternalTransferError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ExternalTransferError::InvalidAmount
            | ExternalTransferError::InvalidRequest(_)
            | ExternalTransferError::InvalidRecipient(_) => 400,
            ExternalTransferError::SenderNotFound(_)
            | ExternalTransferError::TransferNotFound(_) => 404,
            ExternalTransferError::InsufficientFunds => 422,
            ExternalTransferError::GatewayRejected(_) => 502,
            ExternalTransferError::GatewayUnavailable(_) | ExternalTransferError::Conflict => 503,
            ExternalTransferError::Storage(_) => 500,
        }
    }

    /// Caller-facing message; storage and gateway text stay in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            ExternalTransferError::InvalidAmount => "Amount must be greater than 0",
            ExternalTransferError::InvalidRequest(_) => "Missing or invalid transfer details",
            ExternalTransferError::SenderNotFound(_) => "Sender not found",
            ExternalTransferError::InsufficientFunds => "Insufficient funds",
            ExternalTransferError::TransferNotFound(_) => "Transfer not found",
            ExternalTransferError::InvalidRecipient(_) => "Invalid recipient account",
            _ => "Transfer failed",
        }
    }
}

impl From<LedgerError> for ExternalTransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { .. } => ExternalTransferError::InsufficientFunds,
            LedgerError::AccountNotFound(id) => ExternalTransferError::SenderNotFound(id),
            LedgerError::RecordNotFound(r) => ExternalTransferError::TransferNotFound(r),
            LedgerError::Conflict => ExternalTransferError::Conflict,
            other => ExternalTransferError::Storage(other.to_string()),
        }
    }
}

impl From<GatewayError> for ExternalTransferError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidRecipient(r) => ExternalTransferError::InvalidRecipient(r),
            GatewayError::Rejected(r) => ExternalTransferError::GatewayRejected(r),
            GatewayError::Unavailable(r) => ExternalTransferError::GatewayUnavailable(r),
        }
    }
}
