//! Internal Transfers
//!
//! Account-to-account transfers inside the ledger, plus bill payment
//! debits. Both complete synchronously in a single ledger write.

pub mod engine;
pub mod error;

pub use engine::{InternalTransferRequest, PaymentReceipt, TransferEngine, TransferReceipt};
pub use error::TransferError;
