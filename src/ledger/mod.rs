//! Ledger Store
//!
//! Authoritative record of account balances and the audit trail. The
//! store owns atomicity: services describe a [`LedgerWrite`] and the store
//! commits all of it or none of it.
//!
//! Two backends implement [`LedgerStore`]:
//! - [`PgLedgerStore`]: PostgreSQL, row locks plus conditional updates
//! - [`InMemoryLedger`]: per-account async mutexes, used in tests

pub mod db;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod state;
pub mod store;
pub mod types;

pub use db::Database;
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use postgres::PgLedgerStore;
pub use state::RecordStatus;
pub use store::{LedgerEntry, LedgerStore, LedgerWrite, StatusTransition, WriteOutcome};
pub use types::{
    Account, Deposit, DepositMethod, Transaction, TransactionCategory, Transfer, TransferKind,
};

use crate::core_types::AccountId;

const ACCOUNT_NUMBER_BASE: i64 = 3_000_000_000;

/// Public 10-digit account number derived from the account id
pub fn account_number_for(account_id: AccountId) -> String {
    format!("{:010}", ACCOUNT_NUMBER_BASE + account_id)
}
