//! Money Conversion Module
//!
//! Unified conversion between the internal `i64` minor-unit representation
//! and client-facing decimal numbers/strings. All conversions MUST go
//! through this module.
//!
//! ## Internal Representation
//! - Every amount is an `i64` count of minor units (kobo / cents)
//! - The scale factor is `10^MINOR_UNIT_DECIMALS`
//! - Floating point never touches a balance
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use thriftpay_ledger::money::{format_amount, to_minor_units};
//!
//! let internal = to_minor_units(Decimal::new(3005, 1)).unwrap();
//! assert_eq!(internal, 30_050); // 300.5 = 30050 kobo
//! assert_eq!(format_amount(internal), "300.50");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::Amount;

/// Decimal places of the ledger currency (NGN kobo)
pub const MINOR_UNIT_DECIMALS: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Client → Internal (Decimal → i64 minor units)
// ============================================================================

/// Convert a client decimal amount into minor units.
///
/// Zero and negative values are converted faithfully; rejecting them is a
/// business rule that each component reports with its own message.
///
/// # Errors
/// * `PrecisionOverflow` - more than [`MINOR_UNIT_DECIMALS`] fractional digits
/// * `Overflow` - does not fit in `i64` minor units
pub fn to_minor_units(decimal: Decimal) -> Result<Amount, MoneyError> {
    let normalized = decimal.normalize();
    if normalized.scale() > MINOR_UNIT_DECIMALS {
        return Err(MoneyError::PrecisionOverflow {
            provided: normalized.scale(),
            max: MINOR_UNIT_DECIMALS,
        });
    }

    let multiplier = Decimal::from(10i64.pow(MINOR_UNIT_DECIMALS));
    let scaled = normalized
        .checked_mul(multiplier)
        .ok_or(MoneyError::Overflow)?;

    scaled.trunc().to_i64().ok_or(MoneyError::Overflow)
}

/// Parse a client string amount (e.g. `"1500.25"`) into minor units.
pub fn parse_amount(amount_str: &str) -> Result<Amount, MoneyError> {
    let trimmed = amount_str.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    if trimmed.starts_with('.') || trimmed.ends_with('.') {
        return Err(MoneyError::InvalidFormat(
            "use 0.5 not .5 and 5.0 not 5.".into(),
        ));
    }
    if trimmed.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }

    let decimal = Decimal::from_str(trimmed)
        .map_err(|e| MoneyError::InvalidFormat(format!("invalid decimal: {}", e)))?;
    to_minor_units(decimal)
}

// ============================================================================
// Format: Internal → Client (i64 → String)
// ============================================================================

/// Format minor units for display, always with two decimals.
///
/// ```rust
/// assert_eq!(thriftpay_ledger::money::format_amount(-1250), "-12.50");
/// ```
pub fn format_amount(value: Amount) -> String {
    let decimal = Decimal::new(value, MINOR_UNIT_DECIMALS);
    format!("{:.prec$}", decimal, prec = MINOR_UNIT_DECIMALS as usize)
}

// ============================================================================
// ClientAmount: API boundary input
// ============================================================================

/// Amount as sent by a client or a gateway callback.
///
/// Accepts both JSON numbers (`300.5`) and strings (`"300.50"`). The sign is
/// preserved so a negative request can be rejected with a business message
/// rather than a deserialization error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientAmount(Decimal);

impl ClientAmount {
    pub fn new(decimal: Decimal) -> Self {
        Self(decimal)
    }

    pub fn inner(self) -> Decimal {
        self.0
    }

    pub fn to_minor_units(self) -> Result<Amount, MoneyError> {
        to_minor_units(self.0)
    }
}

impl<'de> Deserialize<'de> for ClientAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        match DecimalOrString::deserialize(deserializer)? {
            DecimalOrString::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(D::Error::custom("Amount cannot be empty"));
                }
                Decimal::from_str(trimmed)
                    .map(ClientAmount)
                    .map_err(|e| D::Error::custom(format!("Invalid decimal: {}", e)))
            }
            DecimalOrString::Number(d) => Ok(ClientAmount(d)),
        }
    }
}

impl Serialize for ClientAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
