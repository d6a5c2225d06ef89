//! Subscription source port - live subscription state from the payment processor.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionSnapshot;

/// Fetches authoritative subscription snapshots.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Get the current state of a subscription.
    ///
    /// Implementations do not time out on their own; callers bound latency.
    async fn fetch_subscription_snapshot(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, SourceError>;
}

/// Error from the payment processor API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    /// Error code for categorization.
    pub code: SourceErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl SourceError {
    /// Create a new source error.
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(SourceErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an error for a response that could not be interpreted.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for SourceError {}

/// Categories of processor API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorCode {
    /// Connection failed or timed out.
    NetworkError,
    /// API key rejected.
    AuthenticationError,
    /// Resource does not exist.
    NotFound,
    /// Request rejected for a reason other than authentication (4xx).
    InvalidRequest,
    /// Too many requests.
    RateLimitExceeded,
    /// Processor-side failure (5xx).
    ProviderError,
    /// Response body did not match the expected shape.
    InvalidResponse,
}

impl SourceErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceErrorCode::NetworkError
                | SourceErrorCode::RateLimitExceeded
                | SourceErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceErrorCode::NetworkError => "network_error",
            SourceErrorCode::AuthenticationError => "authentication_error",
            SourceErrorCode::NotFound => "not_found",
            SourceErrorCode::InvalidRequest => "invalid_request",
            SourceErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            SourceErrorCode::ProviderError => "provider_error",
            SourceErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_provider_errors_are_retryable() {
        assert!(SourceError::network("reset").retryable);
        assert!(SourceError::new(SourceErrorCode::ProviderError, "502").retryable);
        assert!(SourceError::new(SourceErrorCode::RateLimitExceeded, "429").retryable);
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!SourceError::authentication("bad key").retryable);
        assert!(!SourceError::not_found("Subscription").retryable);
        assert!(!SourceError::invalid_response("status: paused").retryable);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = SourceError::not_found("Subscription");
        assert_eq!(err.to_string(), "not_found: Subscription not found");
    }

    #[test]
    fn provider_code_is_attached() {
        let err = SourceError::network("x").with_provider_code("resource_missing");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[allow(dead_code)]
    fn _accepts_dyn(_: &dyn SubscriptionSource) {}
}
