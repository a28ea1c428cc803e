//! Transfer Error Types

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;

/// Transfer error types
///
/// `code()` is the stable machine-readable kind; `public_message()` is the
/// only text a caller ever sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Sender and recipient are the same account")]
    SelfTransferNotAllowed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Account Errors ===
    #[error("Sender account not found: {0}")]
    SenderNotFound(AccountId),

    #[error("Recipient account not found: {0}")]
    RecipientNotFound(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    // === System Errors ===
    #[error("Ledger busy, retries exhausted")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SelfTransferNotAllowed => "SELF_TRANSFER",
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::SenderNotFound(_) => "SENDER_NOT_FOUND",
            TransferError::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::Conflict => "CONFLICT",
            TransferError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount
            | TransferError::SelfTransferNotAllowed
            | TransferError::InvalidRequest(_) => 400,
            TransferError::SenderNotFound(_) | TransferError::RecipientNotFound(_) => 404,
            TransferError::InsufficientFunds => 422,
            TransferError::Conflict => 503,
            TransferError::Storage(_) => 500,
        }
    }

    /// Normalized caller-facing message
    pub fn public_message(&self) -> &'static str {
        match self {
            TransferError::InsufficientFunds => "Insufficient funds",
            TransferError::RecipientNotFound(_) => "Recipient not found",
            TransferError::SenderNotFound(_) => "Sender not found",
            TransferError::InvalidAmount => "Amount must be greater than 0",
            _ => "Transfer failed",
        }
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { .. } => TransferError::InsufficientFunds,
            LedgerError::Conflict => TransferError::Conflict,
            other => TransferError::Storage(other.to_string()),
        }
    }
}
