//! Stripe subscription source.
//!
//! Implements `SubscriptionSource` against the Stripe REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let source = StripeSubscriptionSource::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::api_types::{StripeErrorResponse, StripeSubscription};
use crate::domain::billing::{SubscriptionSnapshot, SubscriptionStatus};
use crate::ports::{SourceError, SourceErrorCode, SubscriptionSource};

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Connection-level timeout for each request.
    request_timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Reads live subscriptions from Stripe.
pub struct StripeSubscriptionSource {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeSubscriptionSource {
    /// Create a new Stripe source with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl SubscriptionSource for StripeSubscriptionSource {
    async fn fetch_subscription_snapshot(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, SourceError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| SourceError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            warn!(
                subscription_id,
                http_status = status.as_u16(),
                provider_code = err.provider_code.as_deref().unwrap_or("-"),
                "Stripe subscription lookup failed"
            );
            return Err(err);
        }

        let stripe_sub: StripeSubscription = response.json().await.map_err(|e| {
            SourceError::invalid_response(format!("Failed to parse Stripe response: {}", e))
        })?;

        snapshot_from_api(stripe_sub)
    }
}

/// Converts the API object, rejecting statuses outside the closed set.
fn snapshot_from_api(stripe_sub: StripeSubscription) -> Result<SubscriptionSnapshot, SourceError> {
    let status = stripe_sub
        .status
        .parse::<SubscriptionStatus>()
        .map_err(|e| SourceError::invalid_response(e.to_string()))?;

    let period_end = stripe_sub.period_end().ok_or_else(|| {
        SourceError::invalid_response(format!(
            "Subscription {} has no current_period_end",
            stripe_sub.id
        ))
    })?;

    Ok(SubscriptionSnapshot::new(stripe_sub.id, status, period_end))
}

fn error_from_response(status: reqwest::StatusCode, body: &str) -> SourceError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status.as_u16()));

    let code = match status.as_u16() {
        401 | 403 => SourceErrorCode::AuthenticationError,
        404 => SourceErrorCode::NotFound,
        429 => SourceErrorCode::RateLimitExceeded,
        500..=599 => SourceErrorCode::ProviderError,
        _ => SourceErrorCode::InvalidRequest,
    };

    let err = SourceError::new(code, message);
    match parsed.and_then(|e| e.error.code) {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}
