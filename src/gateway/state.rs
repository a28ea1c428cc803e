use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::deposit::DepositReconciler;
use crate::external::ExternalTransferCoordinator;
use crate::ledger::{Database, LedgerStore};
use crate::transfer::TransferEngine;
use crate::webhook::WebhookProcessor;

/// Gateway application state (shared across handlers)
pub struct AppState {
    /// Ledger backend, used directly by the read endpoints
    pub store: Arc<dyn LedgerStore>,
    pub transfers: TransferEngine,
    pub deposits: Arc<DepositReconciler>,
    pub external: Arc<ExternalTransferCoordinator>,
    pub webhooks: WebhookProcessor,
    /// Callback and internal endpoint secrets
    pub secrets: WebhookConfig,
    /// PostgreSQL pool (None for the memory backend), pinged by health checks
    pub db: Option<Arc<Database>>,
}

impl AppState {
    /// Wire every service onto one store and one payment gateway
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn crate::external::PaymentGateway>,
        deposit_config: crate::config::DepositConfig,
        secrets: WebhookConfig,
    ) -> Self {
        let deposits = Arc::new(DepositReconciler::new(
            store.clone(),
            gateway.clone(),
            deposit_config,
        ));
        let external = Arc::new(ExternalTransferCoordinator::new(store.clone(), gateway));
        let webhooks = WebhookProcessor::new(deposits.clone(), external.clone());

        Self {
            transfers: TransferEngine::new(store.clone()),
            store,
            deposits,
            external,
            webhooks,
            secrets,
            db: None,
        }
    }

    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.db = Some(db);
        self
    }
}
