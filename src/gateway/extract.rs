//! Caller identity
//!
//! Session authentication happens upstream; the auth proxy forwards the
//! authenticated account as `X-Account-Id`. Webhook and internal routes do
//! not use this extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::types::ApiError;
use crate::core_types::AccountId;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Account the request acts on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerAccount(pub AccountId);

impl<S> FromRequestParts<S> for CallerAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing account identity"))?;

        raw.to_str()
            .ok()
            .and_then(|s| s.trim().parse::<AccountId>().ok())
            .filter(|id| *id > 0)
            .map(CallerAccount)
            .ok_or_else(|| ApiError::unauthorized("Invalid account identity"))
    }
}
