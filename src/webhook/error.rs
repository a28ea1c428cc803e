//! Webhook Error Types

use thiserror::Error;

use crate::deposit::DepositError;
use crate::external::ExternalTransferError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// No secret configured for this endpoint
    #[error("Webhook secret not configured")]
    NotConfigured,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Deposit(#[from] DepositError),

    #[error(transparent)]
    Transfer(#[from] ExternalTransferError),
}

impl WebhookError {
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::NotConfigured => "SERVER_MISCONFIGURATION",
            WebhookError::Unauthorized => "UNAUTHORIZED",
            WebhookError::InvalidPayload(_) => "INVALID_PAYLOAD",
            WebhookError::Deposit(e) => e.code(),
            WebhookError::Transfer(e) => e.code(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            WebhookError::NotConfigured => 500,
            WebhookError::Unauthorized => 401,
            WebhookError::InvalidPayload(_) => 400,
            WebhookError::Deposit(e) => e.http_status(),
            WebhookError::Transfer(e) => e.http_status(),
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            WebhookError::NotConfigured => "Server misconfiguration",
            WebhookError::Unauthorized => "Unauthorized",
            WebhookError::InvalidPayload(_) => "Invalid payload",
            WebhookError::Deposit(e) => e.public_message(),
            WebhookError::Transfer(e) => e.public_message(),
        }
    }
}
