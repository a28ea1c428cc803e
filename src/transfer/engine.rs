//! Transfer Engine
//!
//! Peer-to-peer transfers between accounts of this ledger. A transfer is
//! created already completed: the sender debit, the recipient credit and
//! the transfer record are one [`LedgerWrite`], so there is no pending
//! intermediate state to reconcile.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use ulid::Ulid;

use super::error::TransferError;
use crate::core_types::{AccountId, Amount, TransactionId};
use crate::ledger::{
    LedgerEntry, LedgerError, LedgerStore, LedgerWrite, RecordStatus, TransactionCategory,
    Transfer, WriteOutcome,
};

/// Validated internal transfer request
#[derive(Debug, Clone)]
pub struct InternalTransferRequest {
    pub sender_account_id: AccountId,
    pub recipient_account_number: String,
    pub amount: Amount,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub transfer_id: Ulid,
    pub reference: String,
    /// Sender debit row
    pub transaction_id: TransactionId,
    /// Recipient credit row
    pub credit_transaction_id: TransactionId,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: TransactionId,
    pub amount: Amount,
}

pub struct TransferEngine {
    store: Arc<dyn LedgerStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute an internal transfer synchronously.
    ///
    /// Validation happens before any state is touched; the balance check
    /// itself happens inside the ledger write.
    pub async fn execute(
        &self,
        req: InternalTransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        if req.amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }

        let sender = self
            .store
            .get_account(req.sender_account_id)
            .await?
            .ok_or(TransferError::SenderNotFound(req.sender_account_id))?;

        let recipient_number = req.recipient_account_number.trim();
        let recipient = self
            .store
            .get_account_by_number(recipient_number)
            .await?
            .ok_or_else(|| TransferError::RecipientNotFound(recipient_number.to_string()))?;

        if recipient.id == sender.id {
            debug!(account_id = sender.id, "Self-transfer rejected");
            return Err(TransferError::SelfTransferNotAllowed);
        }

        let note = req
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let reference = format!("TRF-{}", Ulid::new());
        let transfer = Transfer::internal(
            reference.clone(),
            sender.id,
            &recipient,
            req.amount,
            note.clone(),
        );
        let transfer_id = transfer.id;

        let suffix = note.as_deref().map(|n| format!(": {}", n)).unwrap_or_default();
        let write = LedgerWrite::new()
            .entry(LedgerEntry::debit(
                sender.id,
                req.amount,
                TransactionCategory::Transfer,
                format!("Transfer to {}{}", recipient.account_number, suffix),
            ))
            .entry(LedgerEntry::credit(
                recipient.id,
                req.amount,
                TransactionCategory::Transfer,
                format!("Transfer from {}{}", sender.account_number, suffix),
            ))
            .create_transfer(transfer);

        match self.store.apply(write).await {
            Ok(WriteOutcome::Applied { transaction_ids }) => {
                let [debit_id, credit_id] = transaction_ids[..] else {
                    return Err(TransferError::Storage(format!(
                        "expected 2 audit rows, got {}",
                        transaction_ids.len()
                    )));
                };
                info!(
                    reference = %reference,
                    sender = sender.id,
                    recipient = recipient.id,
                    amount = req.amount,
                    "Internal transfer completed"
                );
                Ok(TransferReceipt {
                    transfer_id,
                    reference,
                    transaction_id: debit_id,
                    credit_transaction_id: credit_id,
                    status: RecordStatus::Completed,
                })
            }
            Ok(WriteOutcome::Skipped { current }) => Err(TransferError::Storage(format!(
                "transfer write skipped in state {}",
                current
            ))),
            Err(LedgerError::AccountNotFound(id)) if id == sender.id => {
                Err(TransferError::SenderNotFound(id))
            }
            Err(LedgerError::AccountNotFound(_)) => Err(TransferError::RecipientNotFound(
                recipient.account_number.clone(),
            )),
            Err(e) => {
                warn!(reference = %reference, sender = sender.id, error = %e, "Internal transfer rejected");
                Err(e.into())
            }
        }
    }

    /// Debit an account for a bill payment
    pub async fn record_payment(
        &self,
        account_id: AccountId,
        amount: Amount,
        description: &str,
    ) -> Result<PaymentReceipt, TransferError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(TransferError::InvalidRequest(
                "payment description is required".into(),
            ));
        }

        let write = LedgerWrite::new().entry(LedgerEntry::debit(
            account_id,
            amount,
            TransactionCategory::Payment,
            description,
        ));

        match self.store.apply(write).await {
            Ok(WriteOutcome::Applied { transaction_ids }) => {
                let transaction_id = transaction_ids.first().copied().ok_or_else(|| {
                    TransferError::Storage("payment wrote no audit row".into())
                })?;
                info!(account_id, amount, transaction_id, "Payment recorded");
                Ok(PaymentReceipt {
                    transaction_id,
                    amount,
                })
            }
            Ok(WriteOutcome::Skipped { current }) => Err(TransferError::Storage(format!(
                "payment write skipped in state {}",
                current
            ))),
            Err(LedgerError::AccountNotFound(id)) => Err(TransferError::SenderNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    async fn setup(balances: &[Amount]) -> (Arc<InMemoryLedger>, TransferEngine, Vec<AccountId>) {
        let store = Arc::new(InMemoryLedger::new());
        let mut ids = Vec::new();
        for (i, balance) in balances.iter().enumerate() {
            let account = store.open_account(&format!("owner-{}", i)).await.unwrap();
            if *balance > 0 {
                store
                    .apply(LedgerWrite::new().entry(LedgerEntry::credit(
                        account.id,
                        *balance,
                        TransactionCategory::Deposit,
                        "seed",
                    )))
                    .await
                    .unwrap();
            }
            ids.push(account.id);
        }
        let engine = TransferEngine::new(store.clone());
        (store, engine, ids)
    }

    async fn number_of(store: &InMemoryLedger, id: AccountId) -> String {
        store.get_account(id).await.unwrap().unwrap().account_number
    }

    async fn balance_of(store: &InMemoryLedger, id: AccountId) -> Amount {
        store.get_account(id).await.unwrap().unwrap().balance
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let (store, engine, ids) = setup(&[1_000, 0]).await;
        let receipt = engine
            .execute(InternalTransferRequest {
                sender_account_id: ids[0],
                recipient_account_number: number_of(&store, ids[1]).await,
                amount: 300,
                note: Some("rent".into()),
            })
            .await
            .unwrap();

        assert_eq!(balance_of(&store, ids[0]).await, 700);
        assert_eq!(balance_of(&store, ids[1]).await, 300);
        assert_eq!(receipt.status, RecordStatus::Completed);

        let rows = store
            .transactions_for_reference(&receipt.reference)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, -300);
        assert_eq!(rows[1].amount, 300);
        assert_eq!(rows[0].id, receipt.transaction_id);

        let transfer = store.get_transfer(&receipt.reference).await.unwrap().unwrap();
        assert_eq!(transfer.status, RecordStatus::Completed);
        assert_eq!(transfer.recipient_account_id, Some(ids[1]));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let (store, engine, ids) = setup(&[1_000, 0]).await;
        let recipient = number_of(&store, ids[1]).await;
        for amount in [0, -50] {
            let err = engine
                .execute(InternalTransferRequest {
                    sender_account_id: ids[0],
                    recipient_account_number: recipient.clone(),
                    amount,
                    note: None,
                })
                .await
                .unwrap_err();
            assert_eq!(err.public_message(), "Amount must be greater than 0");
        }
        assert_eq!(balance_of(&store, ids[0]).await, 1_000);
        assert!(store.list_transfers(ids[0], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let (_store, engine, ids) = setup(&[1_000]).await;
        let err = engine
            .execute(InternalTransferRequest {
                sender_account_id: ids[0],
                recipient_account_number: "9999999999".into(),
                amount: 10,
                note: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, TransferError::RecipientNotFound("9999999999".into()));
    }

    #[tokio::test]
    async fn test_unknown_sender() {
        let (store, engine, ids) = setup(&[0]).await;
        let err = engine
            .execute(InternalTransferRequest {
                sender_account_id: 404,
                recipient_account_number: number_of(&store, ids[0]).await,
                amount: 10,
                note: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Sender not found");
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let (store, engine, ids) = setup(&[500]).await;
        let err = engine
            .execute(InternalTransferRequest {
                sender_account_id: ids[0],
                recipient_account_number: number_of(&store, ids[0]).await,
                amount: 100,
                note: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, TransferError::SelfTransferNotAllowed);
        assert_eq!(err.code(), "SELF_TRANSFER");
        assert_eq!(balance_of(&store, ids[0]).await, 500);
    }

    #[tokio::test]
    async fn test_insufficient_funds_writes_nothing() {
        let (store, engine, ids) = setup(&[100, 0]).await;
        let err = engine
            .execute(InternalTransferRequest {
                sender_account_id: ids[0],
                recipient_account_number: number_of(&store, ids[1]).await,
                amount: 101,
                note: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Insufficient funds");
        assert_eq!(balance_of(&store, ids[0]).await, 100);
        assert_eq!(balance_of(&store, ids[1]).await, 0);
        assert!(store.list_transfers(ids[0], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_payment() {
        let (store, engine, ids) = setup(&[1_000]).await;
        let receipt = engine
            .record_payment(ids[0], 250, "Electricity bill")
            .await
            .unwrap();
        assert_eq!(balance_of(&store, ids[0]).await, 750);

        let history = store.list_transactions(ids[0], 1).await.unwrap();
        assert_eq!(history[0].id, receipt.transaction_id);
        assert_eq!(history[0].category, TransactionCategory::Payment);

        let err = engine.record_payment(ids[0], 5_000, "TV").await.unwrap_err();
        assert_eq!(err, TransferError::InsufficientFunds);
    }
}
