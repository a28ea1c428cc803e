use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub deposit: DepositConfig,
    #[serde(default)]
    pub payment_gateway: PaymentGatewayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub max_connections: u32,
    /// Retries on serialization failure / deadlock before surfacing
    pub max_conflict_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Memory,
            postgres_url: None,
            max_connections: 20,
            max_conflict_retries: 3,
        }
    }
}

/// Shared secrets for gateway callbacks. Never logged.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    /// `x-webhook-secret` for the deposit webhook
    #[serde(default)]
    pub deposit_secret: Option<String>,
    /// HMAC-SHA512 key for `x-paystack-signature`
    #[serde(default)]
    pub paystack_secret: Option<String>,
    /// `x-internal-secret` for account provisioning
    #[serde(default)]
    pub internal_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DepositConfig {
    pub bank_name: String,
    pub bank_account_number: String,
    pub checkout_base_url: String,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            bank_name: "ThriftPay Partner Bank".to_string(),
            bank_account_number: "0001234567".to_string(),
            checkout_base_url: "https://pay.example.com/checkout".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    /// In-process stand-in; dev with the memory backend only
    #[default]
    Simulated,
    Paystack,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PaymentGatewayConfig {
    pub provider: GatewayProvider,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Payer email sent when opening a hosted checkout
    pub checkout_email: String,
}

impl Default for PaymentGatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::Simulated,
            base_url: "https://api.paystack.co".to_string(),
            timeout_secs: 15,
            checkout_email: "deposits@thriftpay.example".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml`, then apply secret overrides from the
    /// environment (`DEPOSIT_WEBHOOK_SECRET`, `PAYSTACK_SECRET_KEY`,
    /// `INTERNAL_API_SECRET`, `DATABASE_URL`).
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        config.validate_for_env(env)?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup("DEPOSIT_WEBHOOK_SECRET") {
            self.webhook.deposit_secret = Some(secret);
        }
        if let Some(secret) = lookup("PAYSTACK_SECRET_KEY") {
            self.webhook.paystack_secret = Some(secret);
        }
        if let Some(secret) = lookup("INTERNAL_API_SECRET") {
            self.webhook.internal_secret = Some(secret);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.ledger.postgres_url = Some(url);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.backend == LedgerBackend::Postgres && self.ledger.postgres_url.is_none() {
            return Err(ConfigError::Invalid(
                "ledger.backend is postgres but no postgres_url / DATABASE_URL is set".into(),
            ));
        }
        if self.ledger.max_connections == 0 {
            return Err(ConfigError::Invalid("ledger.max_connections must be > 0".into()));
        }
        match self.payment_gateway.provider {
            GatewayProvider::Simulated if self.ledger.backend == LedgerBackend::Postgres => {
                return Err(ConfigError::Invalid(
                    "payment_gateway.provider simulated cannot back a postgres ledger".into(),
                ));
            }
            GatewayProvider::Paystack if self.webhook.paystack_secret.is_none() => {
                return Err(ConfigError::Invalid(
                    "payment_gateway.provider is paystack but PAYSTACK_SECRET_KEY is not set"
                        .into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// The simulated gateway never moves real money; only `dev` may use it.
    fn validate_for_env(&self, env: &str) -> Result<(), ConfigError> {
        if self.payment_gateway.provider == GatewayProvider::Simulated && env != "dev" {
            return Err(ConfigError::Invalid(format!(
                "payment_gateway.provider simulated is not allowed in env {}",
                env
            )));
        }
        Ok(())
    }
}
