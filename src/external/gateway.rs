//! Payment gateway adapter contract
//!
//! The gateway is an external collaborator. The coordinator only depends
//! on this request/response contract; [`SimulatedGateway`] is a
//! deterministic stand-in for local runs and tests.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

use crate::core_types::Amount;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Gateway rejected request: {0}")]
    Rejected(String),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Gateway-side handle for an external bank account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientHandle {
    pub recipient_code: String,
}

/// Gateway accepted an outbound transfer; settlement arrives later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferAcceptance {
    pub transfer_code: String,
}

/// Hosted checkout page for a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Resolve an external bank account into a recipient handle
    async fn create_recipient(
        &self,
        name: &str,
        account_number: &str,
        bank_code: &str,
    ) -> Result<RecipientHandle, GatewayError>;

    /// Ask the gateway to move `amount` minor units to the recipient
    async fn initiate_transfer(
        &self,
        recipient: &RecipientHandle,
        amount: Amount,
        reference: &str,
        reason: Option<&str>,
    ) -> Result<TransferAcceptance, GatewayError>;

    async fn initialize_checkout(
        &self,
        reference: &str,
        amount: Amount,
    ) -> Result<CheckoutSession, GatewayError>;
}

/// In-process gateway with switchable failure modes
#[derive(Debug)]
pub struct SimulatedGateway {
    checkout_base_url: String,
    reject_recipients: AtomicBool,
    reject_transfers: AtomicBool,
    unavailable: AtomicBool,
    transfers_accepted: AtomicU64,
}

impl SimulatedGateway {
    pub fn new(checkout_base_url: impl Into<String>) -> Self {
        Self {
            checkout_base_url: checkout_base_url.into(),
            reject_recipients: AtomicBool::new(false),
            reject_transfers: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            transfers_accepted: AtomicU64::new(0),
        }
    }

    pub fn set_reject_recipients(&self, on: bool) {
        self.reject_recipients.store(on, Ordering::SeqCst);
    }

    pub fn set_reject_transfers(&self, on: bool) {
        self.reject_transfers.store(on, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    pub fn transfers_accepted(&self) -> u64 {
        self.transfers_accepted.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }
}

fn random_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn create_recipient(
        &self,
        name: &str,
        account_number: &str,
        bank_code: &str,
    ) -> Result<RecipientHandle, GatewayError> {
        self.check_available()?;
        if self.reject_recipients.load(Ordering::SeqCst) {
            return Err(GatewayError::InvalidRecipient(account_number.to_string()));
        }
        // NUBAN: 10-digit account, 3-digit bank code
        let nuban = account_number.len() == 10 && account_number.bytes().all(|b| b.is_ascii_digit());
        let bank = bank_code.len() == 3 && bank_code.bytes().all(|b| b.is_ascii_digit());
        if !nuban || !bank || name.trim().is_empty() {
            return Err(GatewayError::InvalidRecipient(account_number.to_string()));
        }
        Ok(RecipientHandle {
            recipient_code: format!("RCP_{}", random_code(12)),
        })
    }

    async fn initiate_transfer(
        &self,
        _recipient: &RecipientHandle,
        amount: Amount,
        _reference: &str,
        _reason: Option<&str>,
    ) -> Result<TransferAcceptance, GatewayError> {
        self.check_available()?;
        if self.reject_transfers.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("transfer declined".into()));
        }
        if amount <= 0 {
            return Err(GatewayError::Rejected("invalid amount".into()));
        }
        self.transfers_accepted.fetch_add(1, Ordering::SeqCst);
        Ok(TransferAcceptance {
            transfer_code: format!("TRF_{}", random_code(12)),
        })
    }

    async fn initialize_checkout(
        &self,
        reference: &str,
        _amount: Amount,
    ) -> Result<CheckoutSession, GatewayError> {
        self.check_available()?;
        let access_code = random_code(16);
        tracing::debug!(reference, "Simulated checkout initialized");
        Ok(CheckoutSession {
            authorization_url: format!(
                "{}/{}",
                self.checkout_base_url.trim_end_matches('/'),
                access_code
            ),
            access_code,
        })
    }
}
