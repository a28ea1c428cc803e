//! Routes authenticated callbacks to the reconcilers.
//!
//! Every branch either fully applies or fully declines its ledger write
//! before returning, so the HTTP response always reflects committed state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::error::WebhookError;
use super::events::{CallbackStatus, DepositCallback, PaystackEvent};
use crate::deposit::{DepositCompletion, DepositError, DepositFailure, DepositReconciler};
use crate::external::{
    ExternalTransferCoordinator, ExternalTransferError, ReconcileResult, SettlementOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookAck {
    DepositCompleted(DepositCompletion),
    DepositFailed(DepositFailure),
    TransferReconciled(ReconcileResult),
    Ignored { reason: String },
}

pub struct WebhookProcessor {
    deposits: Arc<DepositReconciler>,
    transfers: Arc<ExternalTransferCoordinator>,
}

impl WebhookProcessor {
    pub fn new(
        deposits: Arc<DepositReconciler>,
        transfers: Arc<ExternalTransferCoordinator>,
    ) -> Self {
        Self {
            deposits,
            transfers,
        }
    }

    /// Deposit webhook. Unknown references are reported to the sender.
    pub async fn handle_deposit_callback(
        &self,
        callback: DepositCallback,
    ) -> Result<WebhookAck, WebhookError> {
        match callback.status {
            CallbackStatus::Success => {
                let amount = callback.amount_minor()?;
                let completion = self
                    .deposits
                    .complete(&callback.reference, amount, &callback.transaction_id)
                    .await?;
                Ok(WebhookAck::DepositCompleted(completion))
            }
            CallbackStatus::Failed => {
                let failure = self
                    .deposits
                    .fail(&callback.reference, Some(&callback.transaction_id))
                    .await?;
                Ok(WebhookAck::DepositFailed(failure))
            }
            CallbackStatus::Pending => {
                info!(reference = %callback.reference, "Deposit still pending at gateway");
                Ok(WebhookAck::Ignored {
                    reason: "pending".into(),
                })
            }
        }
    }

    /// Paystack webhook. Events for references this ledger does not know
    /// are acknowledged so the gateway stops redelivering them.
    pub async fn handle_paystack_event(
        &self,
        event: PaystackEvent,
    ) -> Result<WebhookAck, WebhookError> {
        info!(event = event.name(), "Paystack event received");

        let result = match event {
            PaystackEvent::ChargeSuccess {
                gateway_transaction_id,
                reference,
                amount,
            } => self
                .deposits
                .complete(&reference, amount, &gateway_transaction_id)
                .await
                .map(WebhookAck::DepositCompleted)
                .map_err(WebhookError::from),
            PaystackEvent::TransferSuccess { reference } => {
                self.reconcile(&reference, SettlementOutcome::Success).await
            }
            PaystackEvent::TransferFailed { reference } => {
                self.reconcile(&reference, SettlementOutcome::Failed).await
            }
            PaystackEvent::TransferReversed { reference } => {
                self.reconcile(&reference, SettlementOutcome::Reversed).await
            }
            PaystackEvent::Other(name) => {
                return Ok(WebhookAck::Ignored { reason: name });
            }
        };

        match result {
            Err(WebhookError::Deposit(DepositError::DepositNotFound(reference)))
            | Err(WebhookError::Transfer(ExternalTransferError::TransferNotFound(reference))) => {
                warn!(reference = %reference, "Paystack event for unknown reference");
                Ok(WebhookAck::Ignored {
                    reason: "unknown reference".into(),
                })
            }
            Err(WebhookError::Deposit(DepositError::AlreadyFailed(reference))) => {
                warn!(reference = %reference, "Charge succeeded for a failed deposit, manual review required");
                Ok(WebhookAck::Ignored {
                    reason: "deposit already failed".into(),
                })
            }
            other => other,
        }
    }

    async fn reconcile(
        &self,
        reference: &str,
        outcome: SettlementOutcome,
    ) -> Result<WebhookAck, WebhookError> {
        let result = self.transfers.reconcile(reference, outcome).await?;
        Ok(WebhookAck::TransferReconciled(result))
    }
}
