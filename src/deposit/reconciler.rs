//! Deposit Reconciler
//!
//! Tracks a deposit from intent to settlement:
//!
//! ```text
//! initiate ─▶ PENDING ──complete(ref, amount, gw_tx)──▶ COMPLETED (+credit, +audit row)
//!                │
//!                └────────fail(ref, gw_tx)────────────▶ FAILED
//! ```
//!
//! Completion is one ledger write gated on `status = pending`, so a
//! callback delivered twice (or two racing deliveries) credits once and
//! the loser replays the winner's transaction id.

use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::DepositError;
use super::instructions::{DepositInitiated, PaymentInstructions};
use crate::config::DepositConfig;
use crate::core_types::{AccountId, Amount, TransactionId};
use crate::external::PaymentGateway;
use crate::ledger::{
    Deposit, DepositMethod, LedgerEntry, LedgerError, LedgerStore, LedgerWrite, RecordStatus,
    StatusTransition, TransactionCategory, WriteOutcome,
};
use crate::money::format_amount;

const REFERENCE_PREFIX: &str = "DEP-";
const REFERENCE_RANDOM_LEN: usize = 16;
const REFERENCE_ATTEMPTS: usize = 3;

/// Result of `CompleteDeposit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositCompletion {
    pub reference: String,
    pub transaction_id: TransactionId,
    pub credited_amount: Amount,
    /// True when the deposit was already completed by an earlier callback
    pub replayed: bool,
}

/// Result of `FailDeposit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositFailure {
    pub reference: String,
    pub status: RecordStatus,
    /// False when the deposit was already terminal
    pub applied: bool,
}

pub struct DepositReconciler {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    config: DepositConfig,
}

fn generate_reference() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERENCE_RANDOM_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}{}", REFERENCE_PREFIX, random)
}

impl DepositReconciler {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: DepositConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Create a pending deposit and the instructions to fund it
    pub async fn initiate(
        &self,
        account_id: AccountId,
        amount: Amount,
        method: DepositMethod,
    ) -> Result<DepositInitiated, DepositError> {
        if amount <= 0 {
            return Err(DepositError::InvalidAmount);
        }

        let mut attempt = 0;
        let deposit = loop {
            attempt += 1;
            let deposit = Deposit::new_pending(generate_reference(), account_id, amount, method);
            match self.store.insert_deposit(&deposit).await {
                Ok(()) => break deposit,
                Err(LedgerError::DuplicateReference(r)) if attempt < REFERENCE_ATTEMPTS => {
                    warn!(reference = %r, attempt, "Deposit reference collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        };

        let checkout = if method == DepositMethod::GatewayCheckout {
            match self
                .gateway
                .initialize_checkout(&deposit.reference, amount)
                .await
            {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(
                        reference = %deposit.reference,
                        gateway = self.gateway.name(),
                        error = %e,
                        "Checkout initialization failed, failing deposit"
                    );
                    self.fail(&deposit.reference, None).await?;
                    return Err(DepositError::CheckoutFailed(e.to_string()));
                }
            }
        } else {
            None
        };

        info!(
            reference = %deposit.reference,
            account_id,
            amount,
            method = %method,
            "Deposit initiated"
        );

        let instructions = PaymentInstructions::for_deposit(&deposit, &self.config, checkout);
        Ok(DepositInitiated {
            deposit_id: deposit.id.to_string(),
            reference: deposit.reference,
            amount: format_amount(amount),
            method,
            message: instructions.message(),
            instructions,
        })
    }

    /// Finalize a deposit exactly once.
    ///
    /// The gateway-reported `amount` is what gets credited; a difference
    /// from the requested amount is logged and kept on the record.
    pub async fn complete(
        &self,
        reference: &str,
        amount: Amount,
        gateway_transaction_id: &str,
    ) -> Result<DepositCompletion, DepositError> {
        if amount <= 0 {
            return Err(DepositError::InvalidAmount);
        }

        let deposit = self
            .store
            .get_deposit(reference)
            .await?
            .ok_or_else(|| DepositError::DepositNotFound(reference.to_string()))?;

        match deposit.status {
            RecordStatus::Completed => return replay(&deposit, gateway_transaction_id),
            RecordStatus::Failed => return Err(DepositError::AlreadyFailed(reference.to_string())),
            RecordStatus::Pending => {}
        }

        if amount != deposit.requested_amount {
            warn!(
                reference,
                requested = deposit.requested_amount,
                reported = amount,
                "Gateway amount differs from requested amount, crediting gateway amount"
            );
        }

        let write = LedgerWrite::new()
            .entry(LedgerEntry::credit(
                deposit.account_id,
                amount,
                TransactionCategory::Deposit,
                format!("Deposit via {}", deposit.method),
            ))
            .transition(StatusTransition::Deposit {
                reference: reference.to_string(),
                from: RecordStatus::Pending,
                to: RecordStatus::Completed,
                gateway_transaction_id: Some(gateway_transaction_id.to_string()),
                credited_amount: Some(amount),
            });

        match self.store.apply(write).await? {
            WriteOutcome::Applied { transaction_ids } => {
                let transaction_id = transaction_ids.first().copied().ok_or_else(|| {
                    DepositError::Storage("deposit credit wrote no audit row".into())
                })?;
                info!(
                    reference,
                    account_id = deposit.account_id,
                    amount,
                    transaction_id,
                    "Deposit completed"
                );
                Ok(DepositCompletion {
                    reference: reference.to_string(),
                    transaction_id,
                    credited_amount: amount,
                    replayed: false,
                })
            }
            WriteOutcome::Skipped { current } => {
                // Lost the race to a concurrent callback
                let latest = self
                    .store
                    .get_deposit(reference)
                    .await?
                    .ok_or_else(|| DepositError::DepositNotFound(reference.to_string()))?;
                match current {
                    RecordStatus::Failed => Err(DepositError::AlreadyFailed(reference.to_string())),
                    _ => replay(&latest, gateway_transaction_id),
                }
            }
        }
    }

    /// Move a pending deposit to FAILED; no ledger mutation
    pub async fn fail(
        &self,
        reference: &str,
        gateway_transaction_id: Option<&str>,
    ) -> Result<DepositFailure, DepositError> {
        let write = LedgerWrite::new().transition(StatusTransition::Deposit {
            reference: reference.to_string(),
            from: RecordStatus::Pending,
            to: RecordStatus::Failed,
            gateway_transaction_id: gateway_transaction_id.map(str::to_owned),
            credited_amount: None,
        });

        match self.store.apply(write).await? {
            WriteOutcome::Applied { .. } => {
                info!(reference, "Deposit failed by gateway");
                Ok(DepositFailure {
                    reference: reference.to_string(),
                    status: RecordStatus::Failed,
                    applied: true,
                })
            }
            WriteOutcome::Skipped { current } => {
                debug!(reference, status = %current, "Deposit already final, failure ignored");
                Ok(DepositFailure {
                    reference: reference.to_string(),
                    status: current,
                    applied: false,
                })
            }
        }
    }
}

fn replay(deposit: &Deposit, gateway_transaction_id: &str) -> Result<DepositCompletion, DepositError> {
    let transaction_id = deposit.transaction_id.ok_or_else(|| {
        DepositError::Storage(format!(
            "completed deposit {} has no transaction",
            deposit.reference
        ))
    })?;
    debug!(
        reference = %deposit.reference,
        transaction_id,
        duplicate_gateway_tx = gateway_transaction_id,
        "Deposit already completed, replaying result"
    );
    Ok(DepositCompletion {
        reference: deposit.reference.clone(),
        transaction_id,
        credited_amount: deposit.credited_amount.unwrap_or(deposit.requested_amount),
        replayed: true,
    })
}
