//! Ledger record types
//!
//! Rows owned by the ledger store: accounts, the append-only transaction
//! log, and the deposit/transfer records whose `reference` column is the
//! idempotency key for gateway callbacks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::state::RecordStatus;
use crate::core_types::{AccountId, Amount, OwnerId, TransactionId};

/// Customer account with its authoritative balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    /// Public 10-digit account number, unique and stable
    pub account_number: String,
    pub owner_id: OwnerId,
    /// Balance in minor units, never negative
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category of an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionCategory {
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "deposit")]
    Deposit,
    #[serde(rename = "payment")]
    Payment,
    /// Compensating credit for an external transfer the gateway failed
    #[serde(rename = "transfer-reversal")]
    TransferReversal,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Transfer => "transfer",
            TransactionCategory::Deposit => "deposit",
            TransactionCategory::Payment => "payment",
            TransactionCategory::TransferReversal => "transfer-reversal",
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(TransactionCategory::Transfer),
            "deposit" => Ok(TransactionCategory::Deposit),
            "payment" => Ok(TransactionCategory::Payment),
            "transfer-reversal" => Ok(TransactionCategory::TransferReversal),
            _ => Err(format!("Invalid transaction category: {}", s)),
        }
    }
}

/// Immutable audit row, written in the same atomic unit as the balance
/// change it records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    /// Signed: credit positive, debit negative
    pub amount: Amount,
    pub category: TransactionCategory,
    pub description: String,
    /// Reference of the deposit/transfer this row belongs to
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Deposit channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMethod {
    BankTransfer,
    Card,
    MobileMoney,
    /// Hosted checkout page created through the payment gateway
    GatewayCheckout,
}

impl DepositMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositMethod::BankTransfer => "bank_transfer",
            DepositMethod::Card => "card",
            DepositMethod::MobileMoney => "mobile_money",
            DepositMethod::GatewayCheckout => "gateway_checkout",
        }
    }
}

impl fmt::Display for DepositMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(DepositMethod::BankTransfer),
            "card" => Ok(DepositMethod::Card),
            "mobile_money" => Ok(DepositMethod::MobileMoney),
            "gateway_checkout" | "paystack" => Ok(DepositMethod::GatewayCheckout),
            _ => Err(format!("Unsupported payment method: {}", s)),
        }
    }
}

/// Inbound funding request settled by the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deposit {
    pub id: Ulid,
    /// Externally visible idempotency key, immutable once issued
    pub reference: String,
    pub account_id: AccountId,
    /// Amount the customer asked to deposit
    pub requested_amount: Amount,
    pub method: DepositMethod,
    pub status: RecordStatus,
    pub gateway_transaction_id: Option<String>,
    /// Amount the gateway reported and the ledger credited
    pub credited_amount: Option<Amount>,
    /// Audit row written on completion
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deposit {
    pub fn new_pending(
        reference: String,
        account_id: AccountId,
        requested_amount: Amount,
        method: DepositMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            reference,
            account_id,
            requested_amount,
            method,
            status: RecordStatus::Pending,
            gateway_transaction_id: None,
            credited_amount: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the gateway credited a different amount than was requested
    pub fn amount_mismatch(&self) -> bool {
        self.credited_amount
            .is_some_and(|credited| credited != self.requested_amount)
    }
}

/// Internal peer transfer or outbound bank transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Internal,
    External,
}

impl TransferKind {
    pub fn id(&self) -> i16 {
        match self {
            TransferKind::Internal => 1,
            TransferKind::External => 2,
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransferKind::Internal),
            2 => Some(TransferKind::External),
            _ => None,
        }
    }
}

/// Outbound movement of funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub id: Ulid,
    pub reference: String,
    pub kind: TransferKind,
    pub sender_account_id: AccountId,
    /// Internal account number or external bank account number
    pub recipient_account_number: String,
    /// Resolved recipient (internal transfers only)
    pub recipient_account_id: Option<AccountId>,
    pub bank_code: Option<String>,
    pub recipient_name: Option<String>,
    pub amount: Amount,
    pub note: Option<String>,
    pub status: RecordStatus,
    /// Transfer code issued by the gateway (external transfers only)
    pub gateway_transfer_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Internal transfer, completed in the same atomic unit that creates it
    pub fn internal(
        reference: String,
        sender_account_id: AccountId,
        recipient: &Account,
        amount: Amount,
        note: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            reference,
            kind: TransferKind::Internal,
            sender_account_id,
            recipient_account_number: recipient.account_number.clone(),
            recipient_account_id: Some(recipient.id),
            bank_code: None,
            recipient_name: None,
            amount,
            note,
            status: RecordStatus::Completed,
            gateway_transfer_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// External transfer accepted by the gateway, awaiting settlement
    #[allow(clippy::too_many_arguments)]
    pub fn external_pending(
        reference: String,
        sender_account_id: AccountId,
        recipient_account_number: String,
        bank_code: String,
        recipient_name: String,
        amount: Amount,
        note: Option<String>,
        gateway_transfer_code: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            reference,
            kind: TransferKind::External,
            sender_account_id,
            recipient_account_number,
            recipient_account_id: None,
            bank_code: Some(bank_code),
            recipient_name: Some(recipient_name),
            amount,
            note,
            status: RecordStatus::Pending,
            gateway_transfer_code: Some(gateway_transfer_code),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_strings() {
        assert_eq!(
            TransactionCategory::TransferReversal.as_str(),
            "transfer-reversal"
        );
        assert_eq!(
            serde_json::to_string(&TransactionCategory::TransferReversal).unwrap(),
            "\"transfer-reversal\""
        );
        assert_eq!(
            "deposit".parse::<TransactionCategory>(),
            Ok(TransactionCategory::Deposit)
        );
    }

    #[test]
    fn test_deposit_method_parse() {
        assert_eq!(
            "mobile_money".parse::<DepositMethod>(),
            Ok(DepositMethod::MobileMoney)
        );
        assert_eq!(
            "paystack".parse::<DepositMethod>(),
            Ok(DepositMethod::GatewayCheckout)
        );
        assert!("crypto".parse::<DepositMethod>().is_err());
    }

    #[test]
    fn test_amount_mismatch() {
        let mut deposit =
            Deposit::new_pending("DEP-1".into(), 1, 50_000, DepositMethod::BankTransfer);
        assert!(!deposit.amount_mismatch());

        deposit.credited_amount = Some(50_000);
        assert!(!deposit.amount_mismatch());

        deposit.credited_amount = Some(49_000);
        assert!(deposit.amount_mismatch());
    }
}
