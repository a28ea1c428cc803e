//! Callback authentication
//!
//! - deposit webhook: shared secret in `x-webhook-secret`
//! - Paystack: hex HMAC-SHA512 of the raw body in `x-paystack-signature`
//!
//! Both comparisons are constant time.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::error::WebhookError;

pub const DEPOSIT_SECRET_HEADER: &str = "x-webhook-secret";
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

type HmacSha512 = Hmac<Sha512>;

/// Check a header secret against the configured one
pub fn verify_shared_secret(
    provided: Option<&str>,
    expected: Option<&str>,
) -> Result<(), WebhookError> {
    let expected = expected
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::NotConfigured)?;
    let provided = provided.ok_or(WebhookError::Unauthorized)?;

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(WebhookError::Unauthorized)
    }
}

/// Check a hex HMAC-SHA512 signature over the exact raw body
pub fn verify_hmac_signature(
    body: &[u8],
    signature_hex: Option<&str>,
    secret: Option<&str>,
) -> Result<(), WebhookError> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::NotConfigured)?;
    let signature_hex = signature_hex.ok_or(WebhookError::Unauthorized)?;
    let signature =
        hex::decode(signature_hex.trim()).map_err(|_| WebhookError::Unauthorized)?;

    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::NotConfigured)?;
    mac.update(body);
    mac.verify_slice(&signature)
        .map_err(|_| WebhookError::Unauthorized)
}

/// Hex HMAC-SHA512 of `body`, as the gateway computes it
pub fn sign_payload(body: &[u8], secret: &str) -> Result<String, WebhookError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::NotConfigured)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
