//! Failures during reconciliation.
//!
//! These happen after the event was acknowledged, so they never reach the
//! processor. They are logged, retried when transient, and otherwise recorded
//! as dead letters.

use thiserror::Error;

use crate::domain::foundation::{DomainError, EmailAddress};

/// Errors raised while reconciling an acknowledged event.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// Event payload did not match the schema selected by its type tag.
    #[error("Failed to decode {event_type} payload: {reason}")]
    PayloadDecode { event_type: String, reason: String },

    /// Processor call for the live subscription failed.
    #[error("Failed to fetch subscription {subscription_id}: {message}")]
    SnapshotFetch {
        subscription_id: String,
        message: String,
        retryable: bool,
    },

    /// Processor does not know the subscription.
    #[error("Subscription {0} not found at payment processor")]
    SnapshotNotFound(String),

    /// Processor call did not complete in time.
    #[error("Timed out fetching subscription {subscription_id} after {timeout_ms}ms")]
    SnapshotTimeout {
        subscription_id: String,
        timeout_ms: u64,
    },

    /// Status event for an email with no account.
    #[error("No account found for {0}")]
    AccountNotFound(EmailAddress),

    /// User directory call failed.
    #[error("User directory error: {0}")]
    Directory(DomainError),

    /// Account was created but its credentials could not be delivered.
    #[error("Failed to deliver credentials to {email}: {message}")]
    Notification { email: EmailAddress, message: String },

    /// The event's shard buffer was full when it was acknowledged.
    #[error("Reconciliation shard {shard} is full")]
    QueueFull { shard: usize },

    /// Reconciliation workers have shut down.
    #[error("Reconciliation queue is closed")]
    QueueClosed,
}

impl ReconcileError {
    pub fn payload_decode(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        ReconcileError::PayloadDecode {
            event_type: event_type.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if another attempt could succeed.
    ///
    /// A failed notification is not retryable: the account already exists, so
    /// a second pass would take the update path and never resend.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::SnapshotFetch { retryable, .. } => *retryable,
            ReconcileError::SnapshotTimeout { .. } => true,
            ReconcileError::Directory(err) => err.is_transient(),
            ReconcileError::PayloadDecode { .. }
            | ReconcileError::SnapshotNotFound(_)
            | ReconcileError::AccountNotFound(_)
            | ReconcileError::Notification { .. }
            | ReconcileError::QueueFull { .. }
            | ReconcileError::QueueClosed => false,
        }
    }

    /// Stable code for logs and dead-letter records.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReconcileError::PayloadDecode { .. } => "PAYLOAD_DECODE_ERROR",
            ReconcileError::SnapshotFetch { .. } => "SNAPSHOT_FETCH_ERROR",
            ReconcileError::SnapshotNotFound(_) => "SNAPSHOT_NOT_FOUND",
            ReconcileError::SnapshotTimeout { .. } => "SNAPSHOT_TIMEOUT",
            ReconcileError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            ReconcileError::Directory(_) => "DIRECTORY_ERROR",
            ReconcileError::Notification { .. } => "NOTIFICATION_ERROR",
            ReconcileError::QueueFull { .. } => "QUEUE_FULL",
            ReconcileError::QueueClosed => "QUEUE_CLOSED",
        }
    }
}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        ReconcileError::Directory(err)
    }
}
