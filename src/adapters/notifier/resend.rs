//! Resend email notifier.
//!
//! Delivers provisioning credentials through `POST /emails` on the Resend API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::billing::ProvisioningSecret;
use crate::domain::foundation::{DomainError, EmailAddress, ErrorCode};
use crate::ports::Notifier;

pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

const SUBJECT: &str = "Your account is ready";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

/// Sends credentials by email via Resend.
pub struct ResendNotifier {
    api_key: SecretString,
    from: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl ResendNotifier {
    /// `from` is a full header value such as `Billing <noreply@example.com>`.
    pub fn new(api_key: SecretString, from: impl Into<String>) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            api_key,
            from: from.into(),
            base_url: DEFAULT_RESEND_BASE_URL.to_string(),
            http_client,
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

fn body_text(email: &EmailAddress, secret: &ProvisioningSecret) -> String {
    format!(
        "Welcome!\n\nYour account for {} has been created.\n\nTemporary password: {}\n\nPlease change it after your first sign-in.\n",
        email,
        secret.expose()
    )
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send_provisioning_credentials(
        &self,
        email: &EmailAddress,
        secret: &ProvisioningSecret,
    ) -> Result<(), DomainError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [email.as_str()],
            subject: SUBJECT,
            text: body_text(email, secret),
        };

        let response = self
            .http_client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DeliveryFailed, format!("Resend request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(email = %email, http_status = status.as_u16(), "Credential email rejected");
            return Err(DomainError::new(
                ErrorCode::DeliveryFailed,
                format!("Resend returned {}: {}", status.as_u16(), body),
            ));
        }

        info!(email = %email, "Credential email sent");
        Ok(())
    }
}
