//! Service configuration.
//!
//! Everything comes from `BILLING_RECONCILER__<SECTION>__<KEY>` environment
//! variables (a `.env` file is read first when present). Only the `payment`
//! section is required; `database` and `email` switch the in-memory and
//! log-only collaborators for real ones.
//!
//! | Section | Drives |
//! |---------|--------|
//! | `server` | listener, log format and filter, request timeout |
//! | `payment` | processor API key and webhook signing secret |
//! | `webhook` | origin allow-list, body cap, signature header and window |
//! | `reconciliation` | grace period, snapshot timeout, shards, retries |
//! | `database` | PostgreSQL user directory |
//! | `email` | Resend credential delivery |

mod database;
mod email;
mod error;
mod payment;
mod reconciliation;
mod server;
mod webhook;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use reconciliation::ReconciliationConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

const ENV_PREFIX: &str = "BILLING_RECONCILER";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub payment: PaymentConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    /// Read the environment into typed sections.
    ///
    /// Fails when `payment` is absent or a value does not parse into its
    /// field type. Range and format checks live in [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check every section; optional sections only when configured.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.webhook.validate()?;
        self.reconciliation.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(email) = &self.email {
            email.validate()?;
        }
        Ok(())
    }
}
