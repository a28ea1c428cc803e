//! API response wrapper and error type
//!
//! Every endpoint answers with the same envelope:
//! - success: `{"success": true, ...data fields}`
//! - failure: `{"success": false, "error": "<public message>", "code": "<MACHINE_CODE>"}`
//!
//! Error messages come from each component's `public_message()`, so storage
//! or gateway internals never reach the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::deposit::DepositError;
use crate::external::ExternalTransferError;
use crate::ledger::LedgerError;
use crate::transfer::TransferError;
use crate::webhook::WebhookError;

/// Unified API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// Data fields are flattened into the envelope
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
            code: Some(code),
        }
    }
}

/// Handler error, rendered as the failure envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 Created with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
    }

    pub fn forbidden(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }

    fn from_parts(status: u16, code: &'static str, msg: &'static str) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::error(self.code, self.msg))).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        Self::from_parts(e.http_status(), e.code(), e.public_message())
    }
}

impl From<DepositError> for ApiError {
    fn from(e: DepositError) -> Self {
        Self::from_parts(e.http_status(), e.code(), e.public_message())
    }
}

impl From<ExternalTransferError> for ApiError {
    fn from(e: ExternalTransferError) -> Self {
        Self::from_parts(e.http_status(), e.code(), e.public_message())
    }
}

impl From<WebhookError> for ApiError {
    fn from(e: WebhookError) -> Self {
        Self::from_parts(e.http_status(), e.code(), e.public_message())
    }
}

/// Read endpoints and account provisioning
impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AccountNotFound(_) => Self::not_found("Account not found"),
            LedgerError::RecordNotFound(_) => Self::not_found("Not found"),
            LedgerError::DuplicateOwner(_) => Self::new(
                StatusCode::CONFLICT,
                "DUPLICATE_OWNER",
                "Owner already has an account",
            ),
            LedgerError::Conflict => Self::service_unavailable("Ledger busy, retry later"),
            other => {
                tracing::error!(error = %other, "Ledger error");
                Self::internal("Internal error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Data {
        reference: &'static str,
    }

    #[test]
    fn test_success_envelope_is_flat() {
        let body = serde_json::to_value(ApiResponse::success(Data { reference: "TRF-1" })).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "reference": "TRF-1"}));
    }

    #[test]
    fn test_error_envelope() {
        let body = serde_json::to_value(ApiResponse::error("INSUFFICIENT_FUNDS", "Insufficient funds"))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "Insufficient funds",
                "code": "INSUFFICIENT_FUNDS"
            })
        );
    }

    #[test]
    fn test_transfer_error_keeps_public_message() {
        let err: ApiError = TransferError::Storage("connection reset by peer".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.msg, "Transfer failed");

        let err: ApiError = TransferError::InsufficientFunds.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.msg, "Insufficient funds");
    }
}
