//! End-to-end ledger scenarios against the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use thriftpay_ledger::config::DepositConfig;
use thriftpay_ledger::core_types::{AccountId, Amount};
use thriftpay_ledger::deposit::{DepositError, DepositReconciler};
use thriftpay_ledger::external::{
    ExternalTransferCoordinator, ExternalTransferRequest, SettlementOutcome, SimulatedGateway,
};
use thriftpay_ledger::ledger::{
    Account, Deposit, DepositMethod, InMemoryLedger, LedgerEntry, LedgerError, LedgerStore,
    LedgerWrite, RecordStatus, Transaction, TransactionCategory, Transfer, WriteOutcome,
};
use thriftpay_ledger::transfer::{InternalTransferRequest, TransferEngine, TransferError};

struct Harness {
    store: Arc<InMemoryLedger>,
    gateway: Arc<SimulatedGateway>,
    engine: Arc<TransferEngine>,
    deposits: DepositReconciler,
    external: ExternalTransferCoordinator,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryLedger::new());
    let gateway = Arc::new(SimulatedGateway::new("https://checkout.test"));
    Harness {
        engine: Arc::new(TransferEngine::new(store.clone())),
        deposits: DepositReconciler::new(store.clone(), gateway.clone(), DepositConfig::default()),
        external: ExternalTransferCoordinator::new(store.clone(), gateway.clone()),
        store,
        gateway,
    }
}

/// Open an account and fund it through a seed credit
async fn funded(h: &Harness, owner: &str, balance: Amount) -> (AccountId, String) {
    let account = h.store.open_account(owner).await.unwrap();
    if balance > 0 {
        h.store
            .apply(LedgerWrite::new().entry(LedgerEntry::credit(
                account.id,
                balance,
                TransactionCategory::Deposit,
                "seed",
            )))
            .await
            .unwrap();
    }
    (account.id, account.account_number)
}

async fn balance(h: &Harness, id: AccountId) -> Amount {
    h.store.get_account(id).await.unwrap().unwrap().balance
}

fn external_request(account: AccountId, amount: Amount) -> ExternalTransferRequest {
    ExternalTransferRequest {
        sender_account_id: account,
        account_number: "0123456789".into(),
        bank_code: "058".into(),
        amount,
        recipient_name: "Ada Obi".into(),
        narration: None,
    }
}

async fn reversal_rows(h: &Harness, reference: &str) -> usize {
    h.store
        .transactions_for_reference(reference)
        .await
        .unwrap()
        .iter()
        .filter(|t| t.category == TransactionCategory::TransferReversal)
        .count()
}

/// Serves one captured snapshot of a deposit or transfer, then reads
/// through. A callback using it has read PENDING just before another
/// callback settled the record.
struct StaleReads {
    inner: Arc<InMemoryLedger>,
    deposit: Mutex<Option<Deposit>>,
    transfer: Mutex<Option<Transfer>>,
}

impl StaleReads {
    fn deposit(inner: Arc<InMemoryLedger>, snapshot: Deposit) -> Self {
        Self {
            inner,
            deposit: Mutex::new(Some(snapshot)),
            transfer: Mutex::new(None),
        }
    }

    fn transfer(inner: Arc<InMemoryLedger>, snapshot: Transfer) -> Self {
        Self {
            inner,
            deposit: Mutex::new(None),
            transfer: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl LedgerStore for StaleReads {
    fn name(&self) -> &'static str {
        "stale-reads"
    }

    async fn open_account(&self, owner_id: &str) -> Result<Account, LedgerError> {
        self.inner.open_account(owner_id).await
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, LedgerError> {
        self.inner.get_account(account_id).await
    }

    async fn get_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, LedgerError> {
        self.inner.get_account_by_number(account_number).await
    }

    async fn apply(&self, write: LedgerWrite) -> Result<WriteOutcome, LedgerError> {
        self.inner.apply(write).await
    }

    async fn insert_deposit(&self, deposit: &Deposit) -> Result<(), LedgerError> {
        self.inner.insert_deposit(deposit).await
    }

    async fn get_deposit(&self, reference: &str) -> Result<Option<Deposit>, LedgerError> {
        let snapshot = self.deposit.lock().unwrap().take();
        match snapshot {
            Some(stale) => Ok(Some(stale)),
            None => self.inner.get_deposit(reference).await,
        }
    }

    async fn get_transfer(&self, reference: &str) -> Result<Option<Transfer>, LedgerError> {
        let snapshot = self.transfer.lock().unwrap().take();
        match snapshot {
            Some(stale) => Ok(Some(stale)),
            None => self.inner.get_transfer(reference).await,
        }
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.inner.list_transactions(account_id, limit).await
    }

    async fn transactions_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.inner.transactions_for_reference(reference).await
    }

    async fn list_transfers(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transfer>, LedgerError> {
        self.inner.list_transfers(account_id, limit).await
    }
}

/// Balance equals the sum of the account's audit rows
async fn assert_audit_consistent(h: &Harness, id: AccountId) {
    let rows = h.store.list_transactions(id, usize::MAX).await.unwrap();
    let sum: Amount = rows.iter().map(|t| t.amount).sum();
    assert_eq!(sum, balance(h, id).await, "audit trail out of sync for {}", id);
}

#[tokio::test]
async fn transfer_conserves_total_balance() {
    let h = harness();
    let (a, _) = funded(&h, "alice", 100_000).await;
    let (b, b_number) = funded(&h, "bob", 0).await;
    let (c, c_number) = funded(&h, "carol", 2_500).await;
    let before = h.store.total_balance().await;

    h.engine
        .execute(InternalTransferRequest {
            sender_account_id: a,
            recipient_account_number: b_number,
            amount: 30_000,
            note: Some("rent".into()),
        })
        .await
        .unwrap();
    h.engine
        .execute(InternalTransferRequest {
            sender_account_id: b,
            recipient_account_number: c_number,
            amount: 10_000,
            note: None,
        })
        .await
        .unwrap();

    assert_eq!(h.store.total_balance().await, before);
    assert_eq!(balance(&h, a).await, 70_000);
    assert_eq!(balance(&h, b).await, 20_000);
    assert_eq!(balance(&h, c).await, 12_500);
    for id in [a, b, c] {
        assert_audit_consistent(&h, id).await;
    }
}

#[tokio::test]
async fn failed_transfer_leaves_no_trace() {
    let h = harness();
    let (a, _) = funded(&h, "alice", 1_000).await;
    let (b, b_number) = funded(&h, "bob", 0).await;

    let err = h
        .engine
        .execute(InternalTransferRequest {
            sender_account_id: a,
            recipient_account_number: b_number,
            amount: 1_001,
            note: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err, TransferError::InsufficientFunds);
    assert_eq!(err.public_message(), "Insufficient funds");

    assert_eq!(balance(&h, a).await, 1_000);
    assert_eq!(balance(&h, b).await, 0);
    assert_eq!(h.store.list_transactions(a, 10).await.unwrap().len(), 1);
    assert!(h.store.list_transactions(b, 10).await.unwrap().is_empty());
    assert!(h.store.list_transfers(a, 10).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_transfers_never_overdraw() {
    const BALANCE: Amount = 1_000;
    const AMOUNT: Amount = 70;
    const ATTEMPTS: usize = 40;

    let h = harness();
    let (sender, _) = funded(&h, "sender", BALANCE).await;
    let mut recipients = Vec::new();
    for i in 0..ATTEMPTS {
        recipients.push(funded(&h, &format!("recipient-{}", i), 0).await.1);
    }

    let mut handles = Vec::new();
    for number in recipients {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .execute(InternalTransferRequest {
                    sender_account_id: sender,
                    recipient_account_number: number,
                    amount: AMOUNT,
                    note: None,
                })
                .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(TransferError::InsufficientFunds) => insufficient += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    let expected = (BALANCE / AMOUNT) as usize;
    assert_eq!(successes, expected);
    assert_eq!(insufficient, ATTEMPTS - expected);
    assert_eq!(
        balance(&h, sender).await,
        BALANCE - expected as Amount * AMOUNT
    );
    assert_eq!(h.store.total_balance().await, BALANCE);
    assert_audit_consistent(&h, sender).await;
}

#[tokio::test]
async fn deposit_callback_delivered_twice_credits_once() {
    let h = harness();
    let (account, _) = funded(&h, "saver", 0).await;
    h.store
        .insert_deposit(&Deposit::new_pending(
            "DEP-001".into(),
            account,
            50_000,
            DepositMethod::BankTransfer,
        ))
        .await
        .unwrap();

    let first = h.deposits.complete("DEP-001", 50_000, "gw-77").await.unwrap();
    let second = h.deposits.complete("DEP-001", 50_000, "gw-77").await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.transaction_id, second.transaction_id);
    assert_eq!(balance(&h, account).await, 50_000);
    assert_eq!(
        h.store
            .transactions_for_reference("DEP-001")
            .await
            .unwrap()
            .len(),
        1
    );

    let deposit = h.store.get_deposit("DEP-001").await.unwrap().unwrap();
    assert_eq!(deposit.status, RecordStatus::Completed);
    assert_eq!(deposit.transaction_id, Some(first.transaction_id));
    assert_audit_consistent(&h, account).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_deposit_callbacks_credit_once() {
    let h = Arc::new(harness());
    let (account, _) = funded(&h, "saver", 0).await;
    let initiated = h
        .deposits
        .initiate(account, 12_000, DepositMethod::Card)
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        let barrier = barrier.clone();
        let reference = initiated.reference.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            h.deposits.complete(&reference, 12_000, "gw-race").await
        }));
    }
    let mut ids = Vec::new();
    let mut fresh = 0;
    for handle in handles {
        let completion = handle.await.unwrap().unwrap();
        if !completion.replayed {
            fresh += 1;
        }
        ids.push(completion.transaction_id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(fresh, 1);
    assert_eq!(balance(&h, account).await, 12_000);
}

#[tokio::test]
async fn deposit_callback_that_read_pending_replays_the_winner() {
    let h = harness();
    let (account, _) = funded(&h, "saver", 0).await;
    let initiated = h
        .deposits
        .initiate(account, 8_000, DepositMethod::BankTransfer)
        .await
        .unwrap();
    let snapshot = h
        .store
        .get_deposit(&initiated.reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.status, RecordStatus::Pending);

    let winner = h
        .deposits
        .complete(&initiated.reference, 8_000, "gw-1")
        .await
        .unwrap();

    // Second delivery read PENDING before the first one committed
    let late = DepositReconciler::new(
        Arc::new(StaleReads::deposit(h.store.clone(), snapshot)),
        h.gateway.clone(),
        DepositConfig::default(),
    );
    let loser = late
        .complete(&initiated.reference, 8_000, "gw-1")
        .await
        .unwrap();

    assert!(!winner.replayed);
    assert!(loser.replayed);
    assert_eq!(loser.transaction_id, winner.transaction_id);
    assert_eq!(loser.credited_amount, 8_000);
    assert_eq!(balance(&h, account).await, 8_000);
    assert_eq!(
        h.store
            .transactions_for_reference(&initiated.reference)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn deposit_callback_that_read_pending_after_failure_is_refused() {
    let h = harness();
    let (account, _) = funded(&h, "saver", 0).await;
    let initiated = h
        .deposits
        .initiate(account, 8_000, DepositMethod::BankTransfer)
        .await
        .unwrap();
    let snapshot = h
        .store
        .get_deposit(&initiated.reference)
        .await
        .unwrap()
        .unwrap();

    h.deposits.fail(&initiated.reference, None).await.unwrap();

    let late = DepositReconciler::new(
        Arc::new(StaleReads::deposit(h.store.clone(), snapshot)),
        h.gateway.clone(),
        DepositConfig::default(),
    );
    assert_eq!(
        late.complete(&initiated.reference, 8_000, "gw-1")
            .await
            .unwrap_err(),
        DepositError::AlreadyFailed(initiated.reference.clone())
    );
    assert_eq!(balance(&h, account).await, 0);
    assert!(
        h.store
            .transactions_for_reference(&initiated.reference)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn external_failure_delivered_three_times_refunds_once() {
    let h = harness();
    let (account, _) = funded(&h, "payer", 20_000).await;

    let receipt = h
        .external
        .initiate(ExternalTransferRequest {
            sender_account_id: account,
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            amount: 20_000,
            recipient_name: "Ada Obi".into(),
            narration: Some("school fees".into()),
        })
        .await
        .unwrap();
    assert_eq!(receipt.status, RecordStatus::Pending);
    assert_eq!(balance(&h, account).await, 0);
    assert_eq!(h.gateway.transfers_accepted(), 1);

    let mut applied = 0;
    for _ in 0..3 {
        let result = h
            .external
            .reconcile(&receipt.reference, SettlementOutcome::Failed)
            .await
            .unwrap();
        assert_eq!(result.status, RecordStatus::Failed);
        if result.applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(balance(&h, account).await, 20_000);

    let refunds: Vec<_> = h
        .store
        .transactions_for_reference(&receipt.reference)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.amount > 0)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_audit_consistent(&h, account).await;
}

#[tokio::test]
async fn external_success_after_failure_is_ignored() {
    let h = harness();
    let (account, _) = funded(&h, "payer", 5_000).await;
    let receipt = h
        .external
        .initiate(ExternalTransferRequest {
            sender_account_id: account,
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            amount: 5_000,
            recipient_name: "Ada Obi".into(),
            narration: None,
        })
        .await
        .unwrap();

    h.external
        .reconcile(&receipt.reference, SettlementOutcome::Reversed)
        .await
        .unwrap();
    let late = h
        .external
        .reconcile(&receipt.reference, SettlementOutcome::Success)
        .await
        .unwrap();

    assert!(!late.applied);
    assert_eq!(late.status, RecordStatus::Failed);
    assert_eq!(balance(&h, account).await, 5_000);
}

#[tokio::test]
async fn settlement_that_read_pending_does_not_refund_again() {
    let h = harness();
    let (account, _) = funded(&h, "payer", 9_000).await;
    let receipt = h
        .external
        .initiate(external_request(account, 9_000))
        .await
        .unwrap();
    let snapshot = h
        .store
        .get_transfer(&receipt.reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.status, RecordStatus::Pending);

    let first = h
        .external
        .reconcile(&receipt.reference, SettlementOutcome::Failed)
        .await
        .unwrap();
    assert!(first.applied);

    let late = ExternalTransferCoordinator::new(
        Arc::new(StaleReads::transfer(h.store.clone(), snapshot)),
        h.gateway.clone(),
    );
    let second = late
        .reconcile(&receipt.reference, SettlementOutcome::Failed)
        .await
        .unwrap();

    assert!(!second.applied);
    assert_eq!(second.status, RecordStatus::Failed);
    assert_eq!(second.refund_transaction_id, None);
    assert_eq!(balance(&h, account).await, 9_000);
    assert_eq!(reversal_rows(&h, &receipt.reference).await, 1);
    assert_audit_consistent(&h, account).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_failure_callbacks_refund_once() {
    const CALLBACKS: usize = 8;

    let h = Arc::new(harness());
    let (account, _) = funded(&h, "payer", 500).await;
    let receipt = h
        .external
        .initiate(external_request(account, 500))
        .await
        .unwrap();
    assert_eq!(balance(&h, account).await, 0);

    let barrier = Arc::new(Barrier::new(CALLBACKS));
    let mut handles = Vec::new();
    for _ in 0..CALLBACKS {
        let h = h.clone();
        let barrier = barrier.clone();
        let reference = receipt.reference.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            h.external
                .reconcile(&reference, SettlementOutcome::Failed)
                .await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, RecordStatus::Failed);
        if result.applied {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(balance(&h, account).await, 500);
    assert_eq!(reversal_rows(&h, &receipt.reference).await, 1);
    assert_audit_consistent(&h, account).await;
}
