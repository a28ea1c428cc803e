//! Gateway types module
//!
//! - [`response`]: `ApiResponse<T>` envelope, `ApiError`, `ok`/`created`
//! - [`views`]: response DTOs with display-formatted amounts
//! - [`ApiJson`]: JSON body extractor whose rejection uses the envelope

pub mod response;
pub mod views;

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

pub use response::{ApiError, ApiResponse, ApiResult, created, ok};
pub use views::{
    AccountView, DepositView, TransactionList, TransactionView, TransferList, TransferView,
};

/// `Json<T>` with malformed bodies reported as `400 INVALID_REQUEST`
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let rejection: JsonRejection = rejection;
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ApiError::bad_request("Invalid request body"))
            }
        }
    }
}
