//! ThriftPay Ledger service
//!
//! ```text
//! ┌──────────┐   ┌────────────────────────────┐   ┌──────────────┐
//! │  Client  │──▶│  Gateway (axum)            │──▶│ Ledger Store │
//! │ /Webhook │   │  transfer/deposit/external │   │ memory | pg  │
//! └──────────┘   └────────────────────────────┘   └──────────────┘
//! ```
//!
//! Usage: `thriftpay_ledger [--env <name>]` loads `config/<name>.yaml`.

use std::sync::Arc;

use anyhow::Context;

use thriftpay_ledger::config::{AppConfig, GatewayProvider, LedgerBackend};
use thriftpay_ledger::external::{PaymentGateway, PaystackGateway, SimulatedGateway};
use thriftpay_ledger::gateway::{self, state::AppState};
use thriftpay_ledger::ledger::{Database, InMemoryLedger, LedgerStore, PgLedgerStore};
use thriftpay_ledger::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env).with_context(|| format!("loading {} config", env))?;
    let _guard = init_logging(&config);

    tracing::info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        backend = ?config.ledger.backend,
        payment_gateway = ?config.payment_gateway.provider,
        "Starting ThriftPay ledger"
    );
    for (name, secret) in [
        ("deposit", &config.webhook.deposit_secret),
        ("paystack", &config.webhook.paystack_secret),
        ("internal", &config.webhook.internal_secret),
    ] {
        if secret.is_none() {
            tracing::warn!(endpoint = name, "Secret not configured; endpoint will reject all calls");
        }
    }

    let (store, db): (Arc<dyn LedgerStore>, Option<Arc<Database>>) = match config.ledger.backend
    {
        LedgerBackend::Memory => (Arc::new(InMemoryLedger::new()), None),
        LedgerBackend::Postgres => {
            let url = config
                .ledger
                .postgres_url
                .as_deref()
                .context("ledger.postgres_url is required for the postgres backend")?;
            let db = Database::connect(url, config.ledger.max_connections)
                .await
                .context("connecting to PostgreSQL")?;
            db.ensure_schema().await.context("applying ledger schema")?;
            let store = PgLedgerStore::new(db.pool().clone(), config.ledger.max_conflict_retries);
            (Arc::new(store), Some(Arc::new(db)))
        }
    };

    let payment_gateway: Arc<dyn PaymentGateway> = match config.payment_gateway.provider {
        GatewayProvider::Simulated => {
            tracing::warn!("Using simulated payment gateway; no money leaves the ledger");
            Arc::new(SimulatedGateway::new(
                config.deposit.checkout_base_url.clone(),
            ))
        }
        GatewayProvider::Paystack => {
            let key = config
                .webhook
                .paystack_secret
                .as_deref()
                .context("PAYSTACK_SECRET_KEY is required for the paystack gateway")?;
            Arc::new(
                PaystackGateway::new(&config.payment_gateway, key)
                    .context("building Paystack client")?,
            )
        }
    };

    let mut state = AppState::new(
        store,
        payment_gateway,
        config.deposit.clone(),
        config.webhook.clone(),
    );
    if let Some(db) = db {
        state = state.with_database(db);
    }

    gateway::run_server(&config.gateway, Arc::new(state))
        .await
        .context("gateway server")?;

    tracing::info!("Ledger stopped");
    Ok(())
}
