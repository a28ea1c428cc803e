//! Paystack REST client
//!
//! Speaks the three calls the ledger needs: transfer recipients, outbound
//! transfers and hosted checkout. Amounts are kobo, the same minor units
//! the ledger stores. Settlement arrives later through the webhook.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gateway::{
    CheckoutSession, GatewayError, PaymentGateway, RecipientHandle, TransferAcceptance,
};
use crate::config::PaymentGatewayConfig;
use crate::core_types::Amount;

const CURRENCY: &str = "NGN";

pub struct PaystackGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    checkout_email: String,
}

impl fmt::Debug for PaystackGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaystackGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `{status, message, data}` wrapper on every Paystack response
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RecipientData {
    recipient_code: String,
}

#[derive(Debug, Deserialize)]
struct TransferData {
    transfer_code: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutData {
    authorization_url: String,
    access_code: String,
}

#[derive(Serialize)]
struct NewRecipient<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    account_number: &'a str,
    bank_code: &'a str,
    currency: &'a str,
}

#[derive(Serialize)]
struct NewTransfer<'a> {
    source: &'a str,
    amount: Amount,
    recipient: &'a str,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct NewCheckout<'a> {
    email: &'a str,
    amount: Amount,
    reference: &'a str,
}

impl PaystackGateway {
    pub fn new(
        config: &PaymentGatewayConfig,
        secret_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            checkout_email: config.checkout_email.clone(),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("{}: {}", path, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("{}: {}", path, e)))?;
        debug!(path, status = status.as_u16(), "Paystack response");
        decode(status, &text)
    }
}

/// Map an HTTP status and body onto the gateway contract.
///
/// Credential and server-side problems are `Unavailable`; anything else
/// the gateway refuses is `Rejected` with its message.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, GatewayError> {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return Err(GatewayError::Unavailable(format!("HTTP {}", status.as_u16())));
    }

    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope {
            status: true,
            data: Some(data),
            ..
        }) if status.is_success() => Ok(data),
        Ok(envelope) if !envelope.message.is_empty() => Err(GatewayError::Rejected(envelope.message)),
        Ok(_) => Err(GatewayError::Rejected(format!("HTTP {}", status.as_u16()))),
        Err(e) if status.is_success() => Err(GatewayError::Unavailable(format!(
            "malformed response: {}",
            e
        ))),
        Err(_) => Err(GatewayError::Rejected(format!("HTTP {}", status.as_u16()))),
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn name(&self) -> &'static str {
        "paystack"
    }

    async fn create_recipient(
        &self,
        name: &str,
        account_number: &str,
        bank_code: &str,
    ) -> Result<RecipientHandle, GatewayError> {
        let body = NewRecipient {
            kind: "nuban",
            name,
            account_number,
            bank_code,
            currency: CURRENCY,
        };
        let data: RecipientData = self
            .post("/transferrecipient", &body)
            .await
            .map_err(|e| match e {
                GatewayError::Rejected(msg) => {
                    debug!(account_number, bank_code, reason = %msg, "Recipient refused");
                    GatewayError::InvalidRecipient(account_number.to_string())
                }
                other => other,
            })?;
        Ok(RecipientHandle {
            recipient_code: data.recipient_code,
        })
    }

    async fn initiate_transfer(
        &self,
        recipient: &RecipientHandle,
        amount: Amount,
        reference: &str,
        reason: Option<&str>,
    ) -> Result<TransferAcceptance, GatewayError> {
        let body = NewTransfer {
            source: "balance",
            amount,
            recipient: &recipient.recipient_code,
            reference,
            reason,
        };
        let data: TransferData = self.post("/transfer", &body).await?;
        // OTP-gated transfers are parked until someone finalizes them by hand
        if data.status.eq_ignore_ascii_case("otp") {
            return Err(GatewayError::Rejected(
                "transfer requires OTP finalization".into(),
            ));
        }
        Ok(TransferAcceptance {
            transfer_code: data.transfer_code,
        })
    }

    async fn initialize_checkout(
        &self,
        reference: &str,
        amount: Amount,
    ) -> Result<CheckoutSession, GatewayError> {
        let body = NewCheckout {
            email: &self.checkout_email,
            amount,
            reference,
        };
        let data: CheckoutData = self.post("/transaction/initialize", &body).await?;
        Ok(CheckoutSession {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    const KEY: &str = "sk_test_ledger";

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok())
            == Some(&format!("Bearer {}", KEY)[..])
    }

    /// Local stand-in for api.paystack.co
    async fn spawn_paystack() -> String {
        async fn recipient(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if !authorized(&headers) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"status": false, "message": "Invalid key"})),
                );
            }
            if body["account_number"] == "0000000000" {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"status": false, "message": "Could not resolve account name"})),
                );
            }
            (
                StatusCode::CREATED,
                Json(json!({
                    "status": true,
                    "message": "Transfer recipient created successfully",
                    "data": {"recipient_code": "RCP_live1", "type": body["type"]}
                })),
            )
        }

        async fn transfer(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if !authorized(&headers) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"status": false, "message": "Invalid key"})),
                );
            }
            match body["amount"].as_i64() {
                Some(amount) if amount >= 5_000_000 => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"status": false, "message": "Try again later"})),
                ),
                Some(amount) if amount >= 1_000_000 => (
                    StatusCode::OK,
                    Json(json!({
                        "status": true,
                        "message": "Transfer requires OTP to continue",
                        "data": {"transfer_code": "TRF_otp", "status": "otp"}
                    })),
                ),
                _ => (
                    StatusCode::OK,
                    Json(json!({
                        "status": true,
                        "message": "Transfer has been queued",
                        "data": {
                            "transfer_code": "TRF_live1",
                            "status": "pending",
                            "reference": body["reference"]
                        }
                    })),
                ),
            }
        }

        async fn checkout(Json(body): Json<Value>) -> Json<Value> {
            let reference = body["reference"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": format!("https://checkout.paystack.com/{}", reference),
                    "access_code": "acc_1",
                    "reference": reference,
                    "email": body["email"]
                }
            }))
        }

        let app = Router::new()
            .route("/transferrecipient", post(recipient))
            .route("/transfer", post(transfer))
            .route("/transaction/initialize", post(checkout));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn client(base_url: String, key: &str) -> PaystackGateway {
        let config = PaymentGatewayConfig {
            base_url,
            timeout_secs: 5,
            ..PaymentGatewayConfig::default()
        };
        PaystackGateway::new(&config, key).unwrap()
    }

    #[tokio::test]
    async fn test_transfer_and_checkout() {
        let gw = client(spawn_paystack().await, KEY);

        let recipient = gw
            .create_recipient("Ada Obi", "0123456789", "058")
            .await
            .unwrap();
        assert_eq!(recipient.recipient_code, "RCP_live1");

        let accepted = gw
            .initiate_transfer(&recipient, 50_000, "EXT-01", Some("school fees"))
            .await
            .unwrap();
        assert_eq!(accepted.transfer_code, "TRF_live1");

        let session = gw.initialize_checkout("DEP-ABC", 25_000).await.unwrap();
        assert_eq!(
            session.authorization_url,
            "https://checkout.paystack.com/DEP-ABC"
        );
        assert_eq!(session.access_code, "acc_1");
    }

    #[tokio::test]
    async fn test_gateway_refusals() {
        let base_url = spawn_paystack().await;
        let gw = client(base_url.clone(), KEY);
        let recipient = RecipientHandle {
            recipient_code: "RCP_live1".into(),
        };

        assert_eq!(
            gw.create_recipient("Ada Obi", "0000000000", "058").await,
            Err(GatewayError::InvalidRecipient("0000000000".into()))
        );
        assert!(matches!(
            gw.initiate_transfer(&recipient, 1_000_000, "EXT-02", None).await,
            Err(GatewayError::Rejected(_))
        ));
        assert!(matches!(
            gw.initiate_transfer(&recipient, 5_000_000, "EXT-03", None).await,
            Err(GatewayError::Unavailable(_))
        ));

        let wrong_key = client(base_url, "sk_test_wrong");
        assert!(matches!(
            wrong_key.create_recipient("Ada Obi", "0123456789", "058").await,
            Err(GatewayError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let gw = client("http://127.0.0.1:1".into(), KEY);
        assert!(matches!(
            gw.initialize_checkout("DEP-1", 100).await,
            Err(GatewayError::Unavailable(_))
        ));
    }

    #[test]
    fn test_decode() {
        let ok: RecipientData = decode(
            StatusCode::CREATED,
            r#"{"status":true,"message":"ok","data":{"recipient_code":"RCP_1"}}"#,
        )
        .unwrap();
        assert_eq!(ok.recipient_code, "RCP_1");

        assert_eq!(
            decode::<RecipientData>(
                StatusCode::BAD_REQUEST,
                r#"{"status":false,"message":"Invalid bank code"}"#
            )
            .unwrap_err(),
            GatewayError::Rejected("Invalid bank code".into())
        );
        assert!(matches!(
            decode::<RecipientData>(StatusCode::OK, "<html>"),
            Err(GatewayError::Unavailable(_))
        ));
        assert!(matches!(
            decode::<RecipientData>(StatusCode::BAD_GATEWAY, ""),
            Err(GatewayError::Unavailable(_))
        ));
    }
}
