//! Notifier that only logs deliveries.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::domain::billing::ProvisioningSecret;
use crate::domain::foundation::{DomainError, EmailAddress};
use crate::ports::Notifier;

/// Logs each credential delivery without the secret.
///
/// Used when no email provider is configured. Deliveries are kept so tests
/// can assert on them.
#[derive(Default)]
pub struct LoggingNotifier {
    delivered: Mutex<Vec<EmailAddress>>,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recipients notified so far, in delivery order.
    pub fn delivered(&self) -> Vec<EmailAddress> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_provisioning_credentials(
        &self,
        email: &EmailAddress,
        _secret: &ProvisioningSecret,
    ) -> Result<(), DomainError> {
        info!(email = %email, "Provisioning credentials ready for delivery");
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(email.clone());
        }
        Ok(())
    }
}
