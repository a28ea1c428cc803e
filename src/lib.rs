//! ThriftPay Ledger - transfer and deposit-reconciliation engine
//!
//! Moves money between customer accounts and reconciles deposits and
//! outbound bank transfers against asynchronous gateway callbacks.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier and amount aliases
//! - [`money`] - Client decimal <-> minor unit conversion
//! - [`ledger`] - Ledger store: accounts, audit log, deposits, transfers
//! - [`transfer`] - Internal peer-to-peer transfers and bill payments
//! - [`deposit`] - Deposit initiation and completion
//! - [`external`] - Outbound bank transfers and the payment gateway seam
//! - [`webhook`] - Callback authentication and event dispatch
//! - [`gateway`] - axum HTTP boundary
//! - [`config`], [`logging`] - Service configuration and tracing setup

// Core types - must be first!
pub mod core_types;
pub mod money;

// Ledger and the services built on it
pub mod deposit;
pub mod external;
pub mod ledger;
pub mod transfer;
pub mod webhook;

// Service shell
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{AccountId, Amount, TransactionId};
pub use deposit::{DepositError, DepositReconciler};
pub use external::{ExternalTransferCoordinator, PaymentGateway, SimulatedGateway};
pub use ledger::{InMemoryLedger, LedgerError, LedgerStore, PgLedgerStore};
pub use transfer::{TransferEngine, TransferError};
pub use webhook::WebhookProcessor;
