//! Deposits
//!
//! Pending deposit intents and their exactly-once settlement from
//! gateway callbacks.

pub mod error;
pub mod instructions;
pub mod reconciler;

pub use error::DepositError;
pub use instructions::{BankTransferDetails, DepositInitiated, PaymentInstructions};
pub use reconciler::{DepositCompletion, DepositFailure, DepositReconciler};
