//! Method-specific payment instructions returned when a deposit starts

use serde::Serialize;

use crate::config::DepositConfig;
use crate::external::CheckoutSession;
use crate::ledger::{Deposit, DepositMethod};
use crate::money::format_amount;

const DEFAULT_ACCOUNT_NAME: &str = "ThriftPay User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankTransferDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    /// Decimal string, e.g. "500.00"
    pub amount: String,
    pub reference: String,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentInstructions {
    BankTransfer(BankTransferDetails),
    Card {
        checkout_url: String,
    },
    MobileMoney {
        instructions: String,
    },
    GatewayCheckout {
        authorization_url: String,
        access_code: String,
    },
}

impl PaymentInstructions {
    /// Build the instructions for a freshly created deposit.
    ///
    /// `checkout` is only consulted for [`DepositMethod::GatewayCheckout`].
    pub fn for_deposit(
        deposit: &Deposit,
        config: &DepositConfig,
        checkout: Option<CheckoutSession>,
    ) -> Self {
        match deposit.method {
            DepositMethod::BankTransfer => PaymentInstructions::BankTransfer(BankTransferDetails {
                bank_name: config.bank_name.clone(),
                account_number: config.bank_account_number.clone(),
                account_name: DEFAULT_ACCOUNT_NAME.to_string(),
                amount: format_amount(deposit.requested_amount),
                reference: deposit.reference.clone(),
                memo: format!("REF {}", deposit.reference),
            }),
            DepositMethod::Card => PaymentInstructions::Card {
                checkout_url: format!(
                    "{}/{}",
                    config.checkout_base_url.trim_end_matches('/'),
                    deposit.reference
                ),
            },
            DepositMethod::MobileMoney => PaymentInstructions::MobileMoney {
                instructions: "Follow the prompt sent to your device to approve the Mobile Money payment.".to_string(),
            },
            DepositMethod::GatewayCheckout => {
                let session = checkout.unwrap_or_else(|| CheckoutSession {
                    authorization_url: String::new(),
                    access_code: String::new(),
                });
                PaymentInstructions::GatewayCheckout {
                    authorization_url: session.authorization_url,
                    access_code: session.access_code,
                }
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PaymentInstructions::BankTransfer(_) => {
                "Send the exact amount to the provided bank details. The deposit will be confirmed automatically."
            }
            PaymentInstructions::Card { .. } => {
                "Complete your card payment using the checkout link."
            }
            PaymentInstructions::MobileMoney { .. } => {
                "A payment prompt has been sent to your device."
            }
            PaymentInstructions::GatewayCheckout { .. } => {
                "Complete your payment on the checkout page."
            }
        }
    }
}

/// Result of `InitiateDeposit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositInitiated {
    pub deposit_id: String,
    pub reference: String,
    /// Decimal string of the requested amount
    pub amount: String,
    pub method: DepositMethod,
    #[serde(flatten)]
    pub instructions: PaymentInstructions,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DepositConfig {
        DepositConfig {
            bank_name: "ThriftPay Partner Bank".into(),
            bank_account_number: "0001234567".into(),
            checkout_base_url: "https://pay.example.com/checkout/".into(),
        }
    }

    #[test]
    fn test_bank_transfer_details() {
        let deposit =
            Deposit::new_pending("DEP-ABC".into(), 1, 50_000, DepositMethod::BankTransfer);
        let instructions = PaymentInstructions::for_deposit(&deposit, &config(), None);
        let PaymentInstructions::BankTransfer(details) = &instructions else {
            panic!("expected bank transfer instructions");
        };
        assert_eq!(details.amount, "500.00");
        assert_eq!(details.memo, "REF DEP-ABC");

        let json = serde_json::to_value(&instructions).unwrap();
        assert_eq!(json["bank_transfer"]["account_number"], "0001234567");
    }

    #[test]
    fn test_card_checkout_url() {
        let deposit = Deposit::new_pending("DEP-XYZ".into(), 1, 100, DepositMethod::Card);
        let instructions = PaymentInstructions::for_deposit(&deposit, &config(), None);
        assert_eq!(
            instructions,
            PaymentInstructions::Card {
                checkout_url: "https://pay.example.com/checkout/DEP-XYZ".into()
            }
        );
    }

    #[test]
    fn test_flattened_payload() {
        let deposit = Deposit::new_pending("DEP-MM".into(), 1, 100, DepositMethod::MobileMoney);
        let instructions = PaymentInstructions::for_deposit(&deposit, &config(), None);
        let initiated = DepositInitiated {
            deposit_id: deposit.id.to_string(),
            reference: deposit.reference.clone(),
            amount: format_amount(100),
            method: deposit.method,
            message: instructions.message(),
            instructions,
        };
        let json = serde_json::to_value(&initiated).unwrap();
        assert_eq!(json["reference"], "DEP-MM");
        assert!(json["mobile_money"]["instructions"].is_string());
        assert_eq!(json["method"], "mobile_money");
    }
}
