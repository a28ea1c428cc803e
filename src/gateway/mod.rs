//! HTTP boundary
//!
//! ```text
//! /api/v1/health                       GET   liveness + build hash
//! /api/v1/transfer                     POST  internal transfer        (X-Account-Id)
//! /api/v1/transfer/{reference}         GET
//! /api/v1/external-transfer            POST  outbound bank transfer   (X-Account-Id)
//! /api/v1/payment                      POST  bill payment debit       (X-Account-Id)
//! /api/v1/deposit                      POST  initiate deposit         (X-Account-Id)
//! /api/v1/deposit/{reference}          GET
//! /api/v1/account                      GET
//! /api/v1/account/transactions         GET
//! /api/v1/account/transfers            GET
//! /api/v1/webhooks/deposit             POST  x-webhook-secret
//! /api/v1/webhooks/paystack            POST  x-paystack-signature (HMAC-SHA512)
//! /internal/accounts                   POST  x-internal-secret
//! ```

pub mod extract;
pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use state::AppState;

pub use extract::{ACCOUNT_ID_HEADER, CallerAccount};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let account_routes = Router::new()
        .route("/transfer", post(handlers::create_transfer))
        .route("/transfer/{reference}", get(handlers::get_transfer))
        .route("/external-transfer", post(handlers::create_external_transfer))
        .route("/payment", post(handlers::create_payment))
        .route("/deposit", post(handlers::create_deposit))
        .route("/deposit/{reference}", get(handlers::get_deposit))
        .route("/account", get(handlers::get_account))
        .route("/account/transactions", get(handlers::get_transactions))
        .route("/account/transfers", get(handlers::get_transfers));

    let webhook_routes = Router::new()
        .route("/deposit", post(handlers::deposit_webhook))
        .route("/paystack", post(handlers::paystack_webhook));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1", account_routes)
        .nest("/api/v1/webhooks", webhook_routes)
        .route("/internal/accounts", post(handlers::open_account))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(%addr, error = %e, "Failed to bind; is the port already in use?");
    })?;

    tracing::info!(%addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await
}
