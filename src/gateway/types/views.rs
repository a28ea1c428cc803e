//! Response DTOs
//!
//! Amounts leave the ledger as i64 minor units and are rendered here as
//! two-decimal strings. Nothing below converts back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core_types::{AccountId, TransactionId};
use crate::ledger::{
    Account, Deposit, DepositMethod, RecordStatus, Transaction, Transfer, TransferKind,
};
use crate::money::format_amount;

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub account_id: AccountId,
    pub account_number: String,
    pub owner_id: String,
    pub balance: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        Self {
            account_id: a.id,
            account_number: a.account_number,
            owner_id: a.owner_id,
            balance: format_amount(a.balance),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    /// Signed: negative for debits
    pub amount: String,
    pub category: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            amount: format_amount(t.amount),
            category: t.category.as_str(),
            description: t.description,
            reference: t.reference,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Serialize)]
pub struct DepositView {
    pub deposit_id: String,
    pub reference: String,
    pub method: DepositMethod,
    pub status: RecordStatus,
    pub requested_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credited_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub amount_mismatch: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Deposit> for DepositView {
    fn from(d: Deposit) -> Self {
        let amount_mismatch = d.amount_mismatch();
        Self {
            deposit_id: d.id.to_string(),
            reference: d.reference,
            method: d.method,
            status: d.status,
            requested_amount: format_amount(d.requested_amount),
            credited_amount: d.credited_amount.map(format_amount),
            transaction_id: d.transaction_id,
            amount_mismatch,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferView {
    pub transfer_id: String,
    pub reference: String,
    pub kind: TransferKind,
    pub status: RecordStatus,
    pub amount: String,
    pub recipient_account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transfer> for TransferView {
    fn from(t: Transfer) -> Self {
        Self {
            transfer_id: t.id.to_string(),
            reference: t.reference,
            kind: t.kind,
            status: t.status,
            amount: format_amount(t.amount),
            recipient_account_number: t.recipient_account_number,
            bank_code: t.bank_code,
            recipient_name: t.recipient_name,
            note: t.note,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferList {
    pub transfers: Vec<TransferView>,
}
