//! Typed callback payloads

use serde::Deserialize;
use serde_json::Value;

use super::error::WebhookError;
use crate::core_types::Amount;
use crate::money::ClientAmount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Failed,
    Pending,
}

/// Body of the deposit webhook. `amount` is a decimal in major units.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositCallback {
    pub transaction_id: String,
    pub amount: ClientAmount,
    pub status: CallbackStatus,
    pub reference: String,
}

impl DepositCallback {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        let callback: Self = serde_json::from_slice(body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
        if callback.reference.trim().is_empty() {
            return Err(WebhookError::InvalidPayload("empty reference".into()));
        }
        Ok(callback)
    }

    pub fn amount_minor(&self) -> Result<Amount, WebhookError> {
        self.amount
            .to_minor_units()
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

/// Paystack events this ledger acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaystackEvent {
    ChargeSuccess {
        gateway_transaction_id: String,
        reference: String,
        /// Minor units (kobo), as sent by Paystack
        amount: Amount,
    },
    TransferSuccess {
        reference: String,
    },
    TransferFailed {
        reference: String,
    },
    TransferReversed {
        reference: String,
    },
    /// Acknowledged without action
    Other(String),
}

#[derive(Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ChargeData {
    id: Value,
    reference: String,
    amount: Amount,
}

#[derive(Deserialize)]
struct TransferData {
    reference: String,
}

impl PaystackEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(body).map_err(invalid)?;

        let event = match raw.event.as_str() {
            "charge.success" => {
                let data: ChargeData = serde_json::from_value(raw.data).map_err(invalid)?;
                let gateway_transaction_id = match data.id {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    other => {
                        return Err(WebhookError::InvalidPayload(format!(
                            "unexpected charge id: {}",
                            other
                        )));
                    }
                };
                PaystackEvent::ChargeSuccess {
                    gateway_transaction_id,
                    reference: data.reference,
                    amount: data.amount,
                }
            }
            "transfer.success" | "transfer.failed" | "transfer.reversed" => {
                let data: TransferData = serde_json::from_value(raw.data).map_err(invalid)?;
                match raw.event.as_str() {
                    "transfer.success" => PaystackEvent::TransferSuccess {
                        reference: data.reference,
                    },
                    "transfer.failed" => PaystackEvent::TransferFailed {
                        reference: data.reference,
                    },
                    _ => PaystackEvent::TransferReversed {
                        reference: data.reference,
                    },
                }
            }
            _ => PaystackEvent::Other(raw.event),
        };
        Ok(event)
    }

    pub fn name(&self) -> &str {
        match self {
            PaystackEvent::ChargeSuccess { .. } => "charge.success",
            PaystackEvent::TransferSuccess { .. } => "transfer.success",
            PaystackEvent::TransferFailed { .. } => "transfer.failed",
            PaystackEvent::TransferReversed { .. } => "transfer.reversed",
            PaystackEvent::Other(name) => name,
        }
    }
}

fn invalid(e: serde_json::Error) -> WebhookError {
    WebhookError::InvalidPayload(e.to_string())
}
