//! Ledger Store Error Types

use thiserror::Error;

use crate::core_types::{AccountId, Amount};

/// Errors raised by a [`LedgerStore`](super::LedgerStore).
///
/// Every failing write has no effect: accounts, audit rows and record
/// statuses are left exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Amount,
        requested: Amount,
    },

    /// Concurrent conflicting write detected; safe to retry
    #[error("Concurrent modification conflict")]
    Conflict,

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Reference already exists: {0}")]
    DuplicateReference(String),

    #[error("Owner already has an account: {0}")]
    DuplicateOwner(String),

    #[error("Balance would overflow for account {0}")]
    Overflow(AccountId),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Whether the failed write may succeed if attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict)
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        // 40001 serialization_failure, 40P01 deadlock_detected
        if let Some(db_err) = e.as_database_error()
            && let Some(code) = db_err.code()
            && (code == "40001" || code == "40P01")
        {
            return LedgerError::Conflict;
        }
        LedgerError::Database(e.to_string())
    }
}
