//! Gateway callbacks: authentication, payload parsing and dispatch

pub mod error;
pub mod events;
pub mod processor;
pub mod signature;

pub use error::WebhookError;
pub use events::{CallbackStatus, DepositCallback, PaystackEvent};
pub use processor::{WebhookAck, WebhookProcessor};
pub use signature::{
    DEPOSIT_SECRET_HEADER, PAYSTACK_SIGNATURE_HEADER, sign_payload, verify_hmac_signature,
    verify_shared_secret,
};
