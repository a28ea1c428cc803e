//! Ledger Store contract
//!
//! The store is the only writer of balances. Every balance change goes
//! through [`LedgerStore::apply`], which commits a [`LedgerWrite`] as one
//! atomic unit:
//!
//! 1. lock every touched account (ascending id)
//! 2. evaluate the optional conditional status transition
//! 3. validate that no balance goes negative
//! 4. insert the new transfer row (if any)
//! 5. apply deltas and append one audit row per entry
//!
//! A failing step leaves no trace. A transition whose pre-state does not
//! match is reported as [`WriteOutcome::Skipped`] and writes nothing, which
//! is what makes duplicate gateway callbacks harmless.

use async_trait::async_trait;

use super::error::LedgerError;
use super::state::RecordStatus;
use super::types::{Account, Deposit, Transaction, TransactionCategory, Transfer};
use crate::core_types::{AccountId, Amount, TransactionId};

/// One balance change and the audit row that records it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub account_id: AccountId,
    /// Signed delta in minor units
    pub delta: Amount,
    pub category: TransactionCategory,
    pub description: String,
}

impl LedgerEntry {
    pub fn credit(
        account_id: AccountId,
        amount: Amount,
        category: TransactionCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            delta: amount,
            category,
            description: description.into(),
        }
    }

    pub fn debit(
        account_id: AccountId,
        amount: Amount,
        category: TransactionCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            delta: -amount,
            category,
            description: description.into(),
        }
    }
}

/// Compare-and-swap on a record status, evaluated inside the write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Deposit {
        reference: String,
        from: RecordStatus,
        to: RecordStatus,
        gateway_transaction_id: Option<String>,
        /// Amount credited by this write (completion only)
        credited_amount: Option<Amount>,
    },
    Transfer {
        reference: String,
        from: RecordStatus,
        to: RecordStatus,
    },
}

impl StatusTransition {
    pub fn reference(&self) -> &str {
        match self {
            StatusTransition::Deposit { reference, .. }
            | StatusTransition::Transfer { reference, .. } => reference,
        }
    }

    pub fn from_status(&self) -> RecordStatus {
        match self {
            StatusTransition::Deposit { from, .. } | StatusTransition::Transfer { from, .. } => {
                *from
            }
        }
    }

    pub fn to_status(&self) -> RecordStatus {
        match self {
            StatusTransition::Deposit { to, .. } | StatusTransition::Transfer { to, .. } => *to,
        }
    }
}

/// Atomic unit of work for [`LedgerStore::apply`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerWrite {
    pub entries: Vec<LedgerEntry>,
    pub transition: Option<StatusTransition>,
    pub new_transfer: Option<Transfer>,
}

impl LedgerWrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: LedgerEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn transition(mut self, transition: StatusTransition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn create_transfer(mut self, transfer: Transfer) -> Self {
        self.new_transfer = Some(transfer);
        self
    }

    /// Reference stamped on the audit rows of this write
    pub fn reference(&self) -> Option<&str> {
        self.transition
            .as_ref()
            .map(StatusTransition::reference)
            .or_else(|| self.new_transfer.as_ref().map(|t| t.reference.as_str()))
    }

    /// Structural checks shared by every backend
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.entries.is_empty() && self.transition.is_none() && self.new_transfer.is_none() {
            return Err(LedgerError::InvalidRecord("empty ledger write".into()));
        }
        if let Some(entry) = self.entries.iter().find(|e| e.delta == 0) {
            return Err(LedgerError::InvalidRecord(format!(
                "zero delta for account {}",
                entry.account_id
            )));
        }
        if let Some(t) = &self.transition
            && !t.from_status().can_transition_to(t.to_status())
        {
            return Err(LedgerError::InvalidRecord(format!(
                "illegal transition {} -> {}",
                t.from_status(),
                t.to_status()
            )));
        }
        Ok(())
    }
}

/// Result of an accepted [`LedgerWrite`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Everything was committed; ids follow the order of `entries`
    Applied { transaction_ids: Vec<TransactionId> },
    /// The conditional transition did not match; nothing was written
    Skipped { current: RecordStatus },
}

/// Durable, transactional storage of accounts, audit rows, deposits and
/// transfers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Create the single account of an owner with a zero balance
    async fn open_account(&self, owner_id: &str) -> Result<Account, LedgerError>;

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError>;

    async fn get_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError>;

    /// Apply a write atomically (see module docs)
    async fn apply(&self, write: LedgerWrite) -> Result<WriteOutcome, LedgerError>;

    /// Persist a new pending deposit; fails on a duplicate reference
    async fn insert_deposit(&self, deposit: &Deposit) -> Result<(), LedgerError>;

    async fn get_deposit(&self, reference: &str) -> Result<Option<Deposit>, LedgerError>;

    async fn get_transfer(&self, reference: &str) -> Result<Option<Transfer>, LedgerError>;

    /// Newest first
    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Audit rows stamped with a deposit/transfer reference, oldest first
    async fn transactions_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Transfers sent by the account, newest first
    async fn list_transfers(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transfer>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_write_rejected() {
        assert!(matches!(
            LedgerWrite::new().validate(),
            Err(LedgerError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_zero_delta_rejected() {
        let write = LedgerWrite::new().entry(LedgerEntry::credit(
            1,
            0,
            TransactionCategory::Deposit,
            "nothing",
        ));
        assert!(write.validate().is_err());
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let write = LedgerWrite::new().transition(StatusTransition::Transfer {
            reference: "TRF-1".into(),
            from: RecordStatus::Completed,
            to: RecordStatus::Failed,
        });
        assert!(write.validate().is_err());
    }

    #[test]
    fn test_debit_is_negative() {
        let entry = LedgerEntry::debit(3, 300, TransactionCategory::Transfer, "out");
        assert_eq!(entry.delta, -300);
    }

    #[test]
    fn test_reference_prefers_transition() {
        let write = LedgerWrite::new().transition(StatusTransition::Deposit {
            reference: "DEP-001".into(),
            from: RecordStatus::Pending,
            to: RecordStatus::Completed,
            gateway_transaction_id: None,
            credited_amount: None,
        });
        assert_eq!(write.reference(), Some("DEP-001"));
    }
}
