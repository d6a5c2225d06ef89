//! Credential email delivery through Resend.
//!
//! Optional section: without it credential deliveries are only logged.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::EmailAddress;

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub resend_api_key: SecretString,

    /// Mailbox for the `from` header: `Name <address>` or a bare address.
    #[serde(default = "default_from")]
    pub from: String,
}

fn default_from() -> String {
    "Billing <billing@example.com>".to_string()
}

impl EmailConfig {
    /// Address part of `from`, normalized.
    pub fn sender_address(&self) -> Result<EmailAddress, ValidationError> {
        let raw = match (self.from.rfind('<'), self.from.rfind('>')) {
            (Some(open), Some(close)) if open < close => &self.from[open + 1..close],
            _ => self.from.as_str(),
        };
        EmailAddress::parse(raw).map_err(|_| ValidationError::InvalidFromEmail)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let key = self.resend_api_key.expose_secret();
        if key.is_empty() {
            return Err(ValidationError::MissingRequired("email.resend_api_key"));
        }
        if !key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        self.sender_address()?;
        Ok(())
    }
}
