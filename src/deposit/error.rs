//! Deposit Error Types

use thiserror::Error;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Unsupported payment method: {0}")]
    UnsupportedMethod(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Deposit not found: {0}")]
    DepositNotFound(String),

    /// Completion requested for a deposit the gateway already failed
    #[error("Deposit already failed: {0}")]
    AlreadyFailed(String),

    #[error("Checkout initialization failed: {0}")]
    CheckoutFailed(String),

    #[error("Ledger busy, retries exhausted")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DepositError {
    pub fn code(&self) -> &'static str {
        match self {
            DepositError::InvalidAmount => "INVALID_AMOUNT",
            DepositError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            DepositError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            DepositError::DepositNotFound(_) => "DEPOSIT_NOT_FOUND",
            DepositError::AlreadyFailed(_) => "DEPOSIT_ALREADY_FAILED",
            DepositError::CheckoutFailed(_) => "CHECKOUT_FAILED",
            DepositError::Conflict => "CONFLICT",
            DepositError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            DepositError::InvalidAmount | DepositError::UnsupportedMethod(_) => 400,
            DepositError::AccountNotFound(_) | DepositError::DepositNotFound(_) => 404,
            DepositError::AlreadyFailed(_) => 409,
            DepositError::CheckoutFailed(_) => 502,
            DepositError::Conflict => 503,
            DepositError::Storage(_) => 500,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            DepositError::InvalidAmount => "Amount must be greater than 0",
            DepositError::UnsupportedMethod(_) => "Unsupported payment method",
            DepositError::AccountNotFound(_) => "Account not found",
            DepositError::DepositNotFound(_) => "Deposit not found",
            DepositError::AlreadyFailed(_) => "Deposit already failed",
            DepositError::CheckoutFailed(_) => "Payment initialization failed",
            _ => "Deposit failed",
        }
    }
}

impl From<LedgerError> for DepositError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AccountNotFound(id) => DepositError::AccountNotFound(id),
            LedgerError::RecordNotFound(r) => DepositError::DepositNotFound(r),
            LedgerError::Conflict => DepositError::Conflict,
            other => DepositError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_status() {
        let err = DepositError::DepositNotFound("DEP-404".into());
        assert_eq!(err.code(), "DEPOSIT_NOT_FOUND");
        assert_eq!(err.http_status(), 404);
        assert_eq!(DepositError::InvalidAmount.http_status(), 400);
    }

    #[test]
    fn test_ledger_translation_hides_storage_text() {
        let err: DepositError = LedgerError::Database("deadlock".into()).into();
        assert_eq!(err.public_message(), "Deposit failed");
        let err: DepositError = LedgerError::RecordNotFound("DEP-1".into()).into();
        assert_eq!(err, DepositError::DepositNotFound("DEP-1".into()));
    }
}
