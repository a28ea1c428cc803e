//! Gateway callback handlers
//!
//! Both endpoints take the raw body: the secret or signature is checked
//! before the payload is parsed, and a failed check touches nothing.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use crate::webhook::{
    DEPOSIT_SECRET_HEADER, DepositCallback, PAYSTACK_SIGNATURE_HEADER, PaystackEvent, WebhookAck,
    WebhookError, verify_hmac_signature, verify_shared_secret,
};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn rejected(endpoint: &'static str, e: WebhookError) -> ApiError {
    match &e {
        WebhookError::NotConfigured => {
            tracing::error!(endpoint, "Webhook secret not configured")
        }
        WebhookError::Unauthorized => tracing::warn!(endpoint, "Webhook authentication failed"),
        other if other.http_status() >= 500 => {
            tracing::error!(endpoint, error = %other, "Webhook processing failed")
        }
        other => tracing::warn!(endpoint, error = %other, "Webhook rejected"),
    }
    ApiError::from(e)
}

/// POST /api/v1/webhooks/deposit
pub async fn deposit_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    const ENDPOINT: &str = "deposit";

    verify_shared_secret(
        header(&headers, DEPOSIT_SECRET_HEADER),
        state.secrets.deposit_secret.as_deref(),
    )
    .map_err(|e| rejected(ENDPOINT, e))?;

    let callback = DepositCallback::parse(&body).map_err(|e| rejected(ENDPOINT, e))?;
    let ack = state
        .webhooks
        .handle_deposit_callback(callback)
        .await
        .map_err(|e| rejected(ENDPOINT, e))?;
    ok(ack)
}

/// POST /api/v1/webhooks/paystack
pub async fn paystack_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    const ENDPOINT: &str = "paystack";

    verify_hmac_signature(
        &body,
        header(&headers, PAYSTACK_SIGNATURE_HEADER),
        state.secrets.paystack_secret.as_deref(),
    )
    .map_err(|e| rejected(ENDPOINT, e))?;

    let event = PaystackEvent::parse(&body).map_err(|e| rejected(ENDPOINT, e))?;
    let ack = state
        .webhooks
        .handle_paystack_event(event)
        .await
        .map_err(|e| rejected(ENDPOINT, e))?;
    ok(ack)
}
