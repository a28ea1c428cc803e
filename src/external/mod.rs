//! External bank transfers through the payment gateway
//!
//! [`PaystackGateway`] talks to the live API; [`SimulatedGateway`] is the
//! in-process stand-in for dev and tests.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod paystack;

pub use coordinator::{
    ExternalTransferCoordinator, ExternalTransferReceipt, ExternalTransferRequest,
    ReconcileResult, SettlementOutcome,
};
pub use error::ExternalTransferError;
pub use gateway::{
    CheckoutSession, GatewayError, PaymentGateway, RecipientHandle, SimulatedGateway,
    TransferAcceptance,
};
pub use paystack::PaystackGateway;
