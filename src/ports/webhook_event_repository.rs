//! WebhookEventRepository port - ledger of processed webhook events.
//!
//! The processor may deliver the same event multiple times (network timeouts,
//! redelivery after a slow acknowledgment). The ledger lets the processor skip
//! events it already reconciled, and its failed records are the dead letters
//! operators inspect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::billing::{ReconcileError, WebhookEvent};
use crate::domain::foundation::DomainError;

/// Final state of an event's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Success,
    Ignored,
    /// Dead letter: reconciliation failed after all attempts.
    Failed,
}

impl EventOutcome {
    /// Success and ignored outcomes are never reprocessed.
    pub fn is_final(&self) -> bool {
        !matches!(self, EventOutcome::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Success => "success",
            EventOutcome::Ignored => "ignored",
            EventOutcome::Failed => "failed",
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Event ID (evt_xxx format).
    pub event_id: String,

    /// Type tag of the event.
    pub event_type: String,

    /// When the outcome was recorded.
    pub processed_at: DateTime<Utc>,

    pub outcome: EventOutcome,

    /// Error code for failed records.
    pub error_code: Option<String>,

    /// Error message if processing failed, reason if ignored.
    pub detail: Option<String>,

    /// Reconciliation attempts made.
    pub attempts: u32,

    /// Original event payload for debugging and manual replay.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    fn base(event: &WebhookEvent, outcome: EventOutcome, attempts: u32) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            processed_at: Utc::now(),
            outcome,
            error_code: None,
            detail: None,
            attempts,
            payload: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Creates a new success record.
    pub fn success(event: &WebhookEvent, attempts: u32) -> Self {
        Self::base(event, EventOutcome::Success, attempts)
    }

    /// Creates a new ignored record.
    pub fn ignored(event: &WebhookEvent, reason: impl Into<String>) -> Self {
        Self {
            detail: Some(reason.into()),
            ..Self::base(event, EventOutcome::Ignored, 1)
        }
    }

    /// Creates a new dead-letter record.
    pub fn failed(event: &WebhookEvent, error: &ReconcileError, attempts: u32) -> Self {
        Self {
            error_code: Some(error.error_code().to_string()),
            detail: Some(error.to_string()),
            ..Self::base(event, EventOutcome::Failed, attempts)
        }
    }
}

/// Result of attempting to save a webhook event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First record for this event.
    Inserted,
    /// A failed record was overwritten by a newer outcome.
    Replaced,
    /// A final record already exists (duplicate processing elsewhere).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find the recorded outcome of an event.
    ///
    /// Returns `None` if the event hasn't been processed yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Save an outcome.
    ///
    /// A final record (success/ignored) is never overwritten; a failed record
    /// is replaced by any newer outcome.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Most recent dead letters, newest first.
    async fn list_failed(&self, limit: usize) -> Result<Vec<WebhookEventRecord>, DomainError>;

    /// Delete records older than the specified timestamp.
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}
