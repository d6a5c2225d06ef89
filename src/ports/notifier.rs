//! Notifier port - delivers credentials to newly provisioned accounts.

use async_trait::async_trait;

use crate::domain::billing::ProvisioningSecret;
use crate::domain::foundation::{DomainError, EmailAddress};

/// Sends provisioning credentials to a new account holder.
///
/// Failures use `ErrorCode::DeliveryFailed`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_provisioning_credentials(
        &self,
        email: &EmailAddress,
        secret: &ProvisioningSecret,
    ) -> Result<(), DomainError>;
}
