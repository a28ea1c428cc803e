//! External Transfer Coordinator
//!
//! Outbound transfers to bank accounts outside the ledger.
//!
//! ```text
//! validate ─▶ gateway: recipient ─▶ gateway: transfer ─▶ ledger: debit + PENDING
//!                                                             │
//!                         callback success ─▶ COMPLETED ◀─────┤
//!                 callback failed/reversed ─▶ FAILED + refund ◀┘
//! ```
//!
//! The gateway is called before the ledger is touched, so no account lock
//! is ever held across a network round-trip. A gateway rejection therefore
//! leaves nothing to compensate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use ulid::Ulid;

use super::error::ExternalTransferError;
use super::gateway::PaymentGateway;
use crate::core_types::{AccountId, Amount, TransactionId};
use crate::ledger::{
    LedgerEntry, LedgerError, LedgerStore, LedgerWrite, RecordStatus, StatusTransition,
    TransactionCategory, Transfer, WriteOutcome,
};

#[derive(Debug, Clone)]
pub struct ExternalTransferRequest {
    pub sender_account_id: AccountId,
    pub account_number: String,
    pub bank_code: String,
    pub amount: Amount,
    pub recipient_name: String,
    pub narration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTransferReceipt {
    pub transfer_id: Ulid,
    pub reference: String,
    pub transfer_code: String,
    /// Always `pending`: settlement arrives by callback
    pub status: RecordStatus,
    pub transaction_id: TransactionId,
}

/// Settlement reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    Success,
    Failed,
    Reversed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    pub reference: String,
    pub status: RecordStatus,
    /// False when the transfer was already terminal (duplicate callback)
    pub applied: bool,
    pub refund_transaction_id: Option<TransactionId>,
}

pub struct ExternalTransferCoordinator {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ExternalTransferCoordinator {
    pub fn new(store: Arc<dyn LedgerStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn initiate(
        &self,
        req: ExternalTransferRequest,
    ) -> Result<ExternalTransferReceipt, ExternalTransferError> {
        if req.amount <= 0 {
            return Err(ExternalTransferError::InvalidAmount);
        }
        let account_number = req.account_number.trim();
        let bank_code = req.bank_code.trim();
        let recipient_name = req.recipient_name.trim();
        if account_number.is_empty() || bank_code.is_empty() || recipient_name.is_empty() {
            return Err(ExternalTransferError::InvalidRequest(
                "account_number, bank_code and recipient_name are required".into(),
            ));
        }

        // Advisory check; the ledger write re-validates atomically
        let sender = self
            .store
            .get_account(req.sender_account_id)
            .await?
            .ok_or(ExternalTransferError::SenderNotFound(req.sender_account_id))?;
        if sender.balance < req.amount {
            debug!(
                account_id = sender.id,
                balance = sender.balance,
                amount = req.amount,
                "External transfer rejected before gateway call"
            );
            return Err(ExternalTransferError::InsufficientFunds);
        }

        let reference = format!("EXT-{}", Ulid::new());
        let narration = req
            .narration
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let recipient = self
            .gateway
            .create_recipient(recipient_name, account_number, bank_code)
            .await
            .inspect_err(|e| {
                warn!(reference = %reference, gateway = self.gateway.name(), error = %e, "Recipient rejected")
            })?;

        let acceptance = self
            .gateway
            .initiate_transfer(&recipient, req.amount, &reference, narration.as_deref())
            .await
            .inspect_err(|e| {
                warn!(reference = %reference, gateway = self.gateway.name(), error = %e, "Gateway transfer rejected")
            })?;

        let transfer = Transfer::external_pending(
            reference.clone(),
            sender.id,
            account_number.to_string(),
            bank_code.to_string(),
            recipient_name.to_string(),
            req.amount,
            narration,
            acceptance.transfer_code.clone(),
        );
        let transfer_id = transfer.id;

        let write = LedgerWrite::new()
            .entry(LedgerEntry::debit(
                sender.id,
                req.amount,
                TransactionCategory::Transfer,
                format!("Transfer to {} ({})", recipient_name, bank_code),
            ))
            .create_transfer(transfer.clone());

        let transaction_id = match self.store.apply(write).await {
            Ok(WriteOutcome::Applied { transaction_ids }) => {
                transaction_ids.first().copied().ok_or_else(|| {
                    ExternalTransferError::Storage("debit wrote no audit row".into())
                })?
            }
            Ok(WriteOutcome::Skipped { current }) => {
                return Err(ExternalTransferError::Storage(format!(
                    "external transfer write skipped in state {}",
                    current
                )));
            }
            Err(e) => {
                error!(
                    reference = %reference,
                    transfer_code = %acceptance.transfer_code,
                    account_id = sender.id,
                    amount = req.amount,
                    error = %e,
                    "Gateway accepted transfer but local debit failed, manual review required"
                );
                self.record_unbacked(transfer).await;
                return Err(e.into());
            }
        };

        info!(
            reference = %reference,
            transfer_code = %acceptance.transfer_code,
            account_id = sender.id,
            amount = req.amount,
            "External transfer pending settlement"
        );

        Ok(ExternalTransferReceipt {
            transfer_id,
            reference,
            transfer_code: acceptance.transfer_code,
            status: RecordStatus::Pending,
            transaction_id,
        })
    }

    /// Keep a FAILED row carrying the gateway transfer code for a transfer
    /// the gateway accepted but the ledger could not debit. No balance moves.
    async fn record_unbacked(&self, mut transfer: Transfer) {
        transfer.status = RecordStatus::Failed;
        let reference = transfer.reference.clone();
        if let Err(e) = self
            .store
            .apply(LedgerWrite::new().create_transfer(transfer))
            .await
        {
            error!(reference = %reference, error = %e, "Could not persist unbacked external transfer");
        }
    }

    /// Apply a gateway settlement exactly once.
    ///
    /// A failed or reversed transfer refunds the sender in the same write
    /// that moves it to FAILED, so repeated callbacks refund once.
    pub async fn reconcile(
        &self,
        reference: &str,
        outcome: SettlementOutcome,
    ) -> Result<ReconcileResult, ExternalTransferError> {
        let transfer = self
            .store
            .get_transfer(reference)
            .await?
            .ok_or_else(|| ExternalTransferError::TransferNotFound(reference.to_string()))?;

        if transfer.status.is_terminal() {
            debug!(reference, status = %transfer.status, ?outcome, "Transfer already final, callback ignored");
            return Ok(ReconcileResult {
                reference: reference.to_string(),
                status: transfer.status,
                applied: false,
                refund_transaction_id: None,
            });
        }

        let write = match outcome {
            SettlementOutcome::Success => LedgerWrite::new().transition(StatusTransition::Transfer {
                reference: reference.to_string(),
                from: RecordStatus::Pending,
                to: RecordStatus::Completed,
            }),
            SettlementOutcome::Failed | SettlementOutcome::Reversed => LedgerWrite::new()
                .entry(LedgerEntry::credit(
                    transfer.sender_account_id,
                    transfer.amount,
                    TransactionCategory::TransferReversal,
                    format!("Reversal of {}", reference),
                ))
                .transition(StatusTransition::Transfer {
                    reference: reference.to_string(),
                    from: RecordStatus::Pending,
                    to: RecordStatus::Failed,
                }),
        };

        match self.store.apply(write).await {
            Ok(WriteOutcome::Applied { transaction_ids }) => {
                let refund_transaction_id = transaction_ids.first().copied();
                let status = match outcome {
                    SettlementOutcome::Success => RecordStatus::Completed,
                    _ => RecordStatus::Failed,
                };
                info!(
                    reference,
                    ?outcome,
                    status = %status,
                    refunded = refund_transaction_id.is_some(),
                    "External transfer reconciled"
                );
                Ok(ReconcileResult {
                    reference: reference.to_string(),
                    status,
                    applied: true,
                    refund_transaction_id,
                })
            }
            Ok(WriteOutcome::Skipped { current }) => {
                debug!(reference, status = %current, "Lost reconciliation race, callback ignored");
                Ok(ReconcileResult {
                    reference: reference.to_string(),
                    status: current,
                    applied: false,
                    refund_transaction_id: None,
                })
            }
            Err(LedgerError::AccountNotFound(id)) => {
                error!(reference, account_id = id, "Sender of pending transfer vanished");
                Err(ExternalTransferError::SenderNotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}
