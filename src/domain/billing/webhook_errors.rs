//! Failures at the webhook trust boundary.
//!
//! Every variant here is raised before the event is acknowledged, so each one
//! maps to the HTTP status the processor receives.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that reject an inbound webhook request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Request did not come from an allow-listed processor address.
    #[error("Origin not allowed: {0}")]
    OriginRejected(String),

    /// Signature header absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// Signature header present but not in `t=..,v1=..` form.
    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),

    /// No supplied signature matches the recomputed one.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is in the future beyond clock skew tolerance.
    #[error("Timestamp in the future")]
    TimestampInFuture,

    /// Body exceeded the configured cap.
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Body stream failed before completion.
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// Authentic body that is not an event envelope.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl WebhookError {
    /// Returns true for failures of the authenticity proof itself.
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::MalformedSignature(_)
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::TimestampInFuture
        )
    }

    /// Stable code for error response bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::OriginRejected(_) => "ORIGIN_REJECTED",
            WebhookError::MissingSignature
            | WebhookError::MalformedSignature(_)
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::TimestampInFuture => "SIGNATURE_INVALID",
            WebhookError::BodyTooLarge { .. } => "BODY_TOO_LARGE",
            WebhookError::BodyRead(_) => "BODY_READ_ERROR",
            WebhookError::MalformedEvent(_) => "PAYLOAD_DECODE_ERROR",
        }
    }

    /// Maps the error to the HTTP status returned to the processor.
    ///
    /// - 400: rejected, the processor should not expect a different answer
    /// - 503: the body could not be taken in; the processor will redeliver
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::BodyTooLarge { .. } | WebhookError::BodyRead(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
