//! HTTP handlers, one submodule per resource

pub mod account;
pub mod deposit;
pub mod health;
pub mod internal;
pub mod transfer;
pub mod webhook;

pub use account::{get_account, get_transactions, get_transfers};
pub use deposit::{create_deposit, get_deposit};
pub use health::health_check;
pub use internal::{INTERNAL_SECRET_HEADER, open_account};
pub use transfer::{create_external_transfer, create_payment, create_transfer, get_transfer};
pub use webhook::{deposit_webhook, paystack_webhook};
