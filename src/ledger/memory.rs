//! In-memory Ledger Store
//!
//! Same contract as the PostgreSQL store, used by tests and the `memory`
//! backend. Each account sits behind its own `tokio::sync::Mutex`; a write
//! locks all touched accounts in ascending id order (the in-memory
//! equivalent of `SELECT ... FOR UPDATE ORDER BY id`), then the audit log.
//!
//! No `.await` happens after the first mutation of a write, so dropping
//! the future can never leave a half-applied write behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::error::LedgerError;
use super::state::RecordStatus;
use super::store::{LedgerStore, LedgerWrite, StatusTransition, WriteOutcome};
use super::types::{Account, Deposit, Transaction, Transfer};
use super::account_number_for;
use crate::core_types::{AccountId, Amount};

pub struct InMemoryLedger {
    accounts: DashMap<AccountId, Arc<Mutex<Account>>>,
    account_numbers: DashMap<String, AccountId>,
    owners: DashMap<String, AccountId>,
    deposits: DashMap<String, Deposit>,
    transfers: DashMap<String, Transfer>,
    /// Append-only; `id == index + 1`
    transactions: RwLock<Vec<Transaction>>,
    next_account_id: AtomicI64,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            account_numbers: DashMap::new(),
            owners: DashMap::new(),
            deposits: DashMap::new(),
            transfers: DashMap::new(),
            transactions: RwLock::new(Vec::new()),
            next_account_id: AtomicI64::new(1),
        }
    }

    /// Sum of all balances (conservation checks)
    pub async fn total_balance(&self) -> Amount {
        let cells: Vec<Arc<Mutex<Account>>> =
            self.accounts.iter().map(|r| Arc::clone(r.value())).collect();
        let mut total = 0;
        for cell in cells {
            total += cell.lock().await.balance;
        }
        total
    }

    fn account_cell(&self, account_id: AccountId) -> Option<Arc<Mutex<Account>>> {
        self.accounts.get(&account_id).map(|r| Arc::clone(r.value()))
    }

    /// Account whose lock serializes transitions of this record
    fn record_owner(&self, transition: &StatusTransition) -> Result<AccountId, LedgerError> {
        match transition {
            StatusTransition::Deposit { reference, .. } => self
                .deposits
                .get(reference)
                .map(|d| d.account_id)
                .ok_or_else(|| LedgerError::RecordNotFound(reference.clone())),
            StatusTransition::Transfer { reference, .. } => self
                .transfers
                .get(reference)
                .map(|t| t.sender_account_id)
                .ok_or_else(|| LedgerError::RecordNotFound(reference.clone())),
        }
    }

    fn record_status(&self, transition: &StatusTransition) -> Result<RecordStatus, LedgerError> {
        let status = match transition {
            StatusTransition::Deposit { reference, .. } => {
                self.deposits.get(reference).map(|d| d.status)
            }
            StatusTransition::Transfer { reference, .. } => {
                self.transfers.get(reference).map(|t| t.status)
            }
        };
        status.ok_or_else(|| LedgerError::RecordNotFound(transition.reference().to_string()))
    }

    async fn lock_accounts(
        &self,
        ids: &[AccountId],
    ) -> Result<Vec<OwnedMutexGuard<Account>>, LedgerError> {
        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            let cell = self
                .account_cell(*id)
                .ok_or(LedgerError::AccountNotFound(*id))?;
            guards.push(cell.lock_owned().await);
        }
        Ok(guards)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn open_account(&self, owner_id: &str) -> Result<Account, LedgerError> {
        if owner_id.trim().is_empty() {
            return Err(LedgerError::InvalidRecord("empty owner id".into()));
        }

        match self.owners.entry(owner_id.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateOwner(owner_id.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_account_id.fetch_add(1, Ordering::SeqCst);
                let now = Utc::now();
                let account = Account {
                    id,
                    account_number: account_number_for(id),
                    owner_id: owner_id.to_string(),
                    balance: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.account_numbers
                    .insert(account.account_number.clone(), id);
                self.accounts
                    .insert(id, Arc::new(Mutex::new(account.clone())));
                slot.insert(id);
                Ok(account)
            }
        }
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError> {
        match self.account_cell(account_id) {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn get_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError> {
        let id = self.account_numbers.get(account_number).map(|r| *r.value());
        match id {
            Some(id) => self.get_account(id).await,
            None => Ok(None),
        }
    }

    async fn apply(&self, write: LedgerWrite) -> Result<WriteOutcome, LedgerError> {
        write.validate()?;

        // 1. Lock set, ascending
        let mut ids: Vec<AccountId> = write.entries.iter().map(|e| e.account_id).collect();
        if let Some(t) = &write.transition {
            ids.push(self.record_owner(t)?);
        }
        if let Some(transfer) = &write.new_transfer {
            ids.push(transfer.sender_account_id);
        }
        ids.sort_unstable();
        ids.dedup();

        let mut guards = self.lock_accounts(&ids).await?;

        // 2. Conditional transition
        if let Some(t) = &write.transition {
            let current = self.record_status(t)?;
            if current != t.from_status() {
                debug!(
                    reference = t.reference(),
                    current = %current,
                    expected = %t.from_status(),
                    "Transition pre-state mismatch, skipping write"
                );
                return Ok(WriteOutcome::Skipped { current });
            }
        }

        // 3. Balance validation
        let mut new_balances: Vec<Amount> = guards.iter().map(|g| g.balance).collect();
        for entry in &write.entries {
            let idx = ids
                .binary_search(&entry.account_id)
                .map_err(|_| LedgerError::AccountNotFound(entry.account_id))?;
            new_balances[idx] = new_balances[idx]
                .checked_add(entry.delta)
                .ok_or(LedgerError::Overflow(entry.account_id))?;
        }
        for (idx, balance) in new_balances.iter().enumerate() {
            if *balance < 0 {
                return Err(LedgerError::InsufficientFunds {
                    account_id: ids[idx],
                    balance: guards[idx].balance,
                    requested: guards[idx].balance - balance,
                });
            }
        }

        let mut log = self.transactions.write().await;

        // 4. New transfer row (last fallible step)
        if let Some(transfer) = write.new_transfer.clone() {
            match self.transfers.entry(transfer.reference.clone()) {
                Entry::Occupied(_) => {
                    return Err(LedgerError::DuplicateReference(transfer.reference));
                }
                Entry::Vacant(slot) => {
                    slot.insert(transfer);
                }
            }
        }

        // 5. Apply
        let now = Utc::now();
        for (guard, balance) in guards.iter_mut().zip(&new_balances) {
            if guard.balance != *balance {
                guard.balance = *balance;
                guard.updated_at = now;
            }
        }

        let reference = write.reference().map(str::to_owned);
        let mut transaction_ids = Vec::with_capacity(write.entries.len());
        for entry in write.entries {
            let id = log.len() as i64 + 1;
            log.push(Transaction {
                id,
                account_id: entry.account_id,
                amount: entry.delta,
                category: entry.category,
                description: entry.description,
                reference: reference.clone(),
                created_at: now,
            });
            transaction_ids.push(id);
        }

        match &write.transition {
            Some(StatusTransition::Deposit {
                reference,
                to,
                gateway_transaction_id,
                credited_amount,
                ..
            }) => {
                if let Some(mut deposit) = self.deposits.get_mut(reference) {
                    deposit.status = *to;
                    if gateway_transaction_id.is_some() {
                        deposit.gateway_transaction_id = gateway_transaction_id.clone();
                    }
                    if credited_amount.is_some() {
                        deposit.credited_amount = *credited_amount;
                    }
                    if let Some(first) = transaction_ids.first() {
                        deposit.transaction_id = Some(*first);
                    }
                    deposit.updated_at = now;
                }
            }
            Some(StatusTransition::Transfer { reference, to, .. }) => {
                if let Some(mut transfer) = self.transfers.get_mut(reference) {
                    transfer.status = *to;
                    transfer.updated_at = now;
                }
            }
            None => {}
        }

        Ok(WriteOutcome::Applied { transaction_ids })
    }

    async fn insert_deposit(&self, deposit: &Deposit) -> Result<(), LedgerError> {
        if !self.accounts.contains_key(&deposit.account_id) {
            return Err(LedgerError::AccountNotFound(deposit.account_id));
        }
        match self.deposits.entry(deposit.reference.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateReference(
                deposit.reference.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(deposit.clone());
                Ok(())
            }
        }
    }

    async fn get_deposit(&self, reference: &str) -> Result<Option<Deposit>, LedgerError> {
        Ok(self.deposits.get(reference).map(|d| d.value().clone()))
    }

    async fn get_transfer(&self, reference: &str) -> Result<Option<Transfer>, LedgerError> {
        Ok(self.transfers.get(reference).map(|t| t.value().clone()))
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let log = self.transactions.read().await;
        Ok(log
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn transactions_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let log = self.transactions.read().await;
        Ok(log
            .iter()
            .filter(|t| t.reference.as_deref() == Some(reference))
            .cloned()
            .collect())
    }

    async fn list_transfers(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let mut transfers: Vec<Transfer> = self
            .transfers
            .iter()
            .filter(|t| t.sender_account_id == account_id)
            .map(|t| t.value().clone())
            .collect();
        // ULIDs sort by creation time
        transfers.sort_by(|a, b| b.id.cmp(&a.id));
        transfers.truncate(limit);
        Ok(transfers)
    }
}
