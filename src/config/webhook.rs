//! Webhook intake configuration

use axum::http::header::HeaderName;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::billing::{OriginAllowList, DEFAULT_TOLERANCE_SECS};

/// Webhook intake configuration (origin allow-list, body cap, signature)
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Comma-separated source addresses; the processor's published list when unset
    pub allowed_ips: Option<String>,

    /// Take the origin from `X-Forwarded-For` / `X-Real-IP`
    #[serde(default)]
    pub trust_forwarded_headers: bool,

    /// Maximum accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Replay window for signed timestamps
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Header carrying the signature
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl WebhookConfig {
    /// Build the immutable origin allow-list
    pub fn allow_list(&self) -> Result<OriginAllowList, ValidationError> {
        match &self.allowed_ips {
            Some(list) if !list.trim().is_empty() => OriginAllowList::parse(list)
                .map_err(|e| ValidationError::InvalidAllowedIps(e.to_string())),
            _ => Ok(OriginAllowList::processor_defaults()),
        }
    }

    pub fn signature_header_name(&self) -> Result<HeaderName, ValidationError> {
        HeaderName::from_bytes(self.signature_header.as_bytes())
            .map_err(|_| ValidationError::InvalidSignatureHeader(self.signature_header.clone()))
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.allow_list()?;
        self.signature_header_name()?;
        if self.max_body_bytes == 0 {
            return Err(ValidationError::OutOfRange {
                field: "max_body_bytes",
                reason: "must be greater than zero",
            });
        }
        if self.signature_tolerance_secs <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "signature_tolerance_secs",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            allowed_ips: None,
            trust_forwarded_headers: false,
            max_body_bytes: default_max_body_bytes(),
            signature_tolerance_secs: default_signature_tolerance(),
            signature_header: default_signature_header(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    65_536
}

fn default_signature_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_signature_header() -> String {
    "Stripe-Signature".to_string()
}
