//! Webhook processor - routes acknowledged events and records their outcome.
//!
//! ## Design
//!
//! The processor follows these steps:
//! 1. Skip events the ledger already shows as reconciled or ignored
//! 2. Dispatch to the handler registered for the event's type tag
//! 3. Retry transient failures with exponential backoff
//! 4. Record the outcome; a failed record is the event's dead letter
//!
//! Failed events are reprocessed if the processor redelivers them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::event::{EventKind, WebhookEvent};
use super::reconcile_errors::ReconcileError;
use super::status::SubscriptionStatus;
use crate::domain::foundation::EmailAddress;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// What reconciling one event did to the account directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First paid invoice for this email; credentials were sent.
    AccountCreated { email: EmailAddress },
    /// Existing account received a new status and expiry.
    AccountRenewed { email: EmailAddress },
    /// Existing account received a new status.
    StatusUpdated {
        email: EmailAddress,
        status: SubscriptionStatus,
    },
    /// Account already reflected the event.
    Unchanged { email: EmailAddress },
    /// No handler for the event type.
    Ignored { event_type: String },
}

impl ReconcileOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, ReconcileOutcome::Ignored { .. })
    }
}

/// Handler for a specific type of webhook event.
///
/// The handler receives the raw envelope and decodes the payload schema its
/// type tag selects.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event kind(s) this handler processes.
    fn handles(&self) -> Vec<EventKind>;

    async fn handle(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, ReconcileError>;
}

/// Dispatches events to the handler registered for their type tag.
#[derive(Clone, Default)]
pub struct EventRouter {
    handlers: HashMap<EventKind, Arc<dyn WebhookEventHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every kind it declares.
    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        for kind in handler.handles() {
            if kind != EventKind::Other {
                self.handlers.insert(kind, Arc::clone(&handler));
            }
        }
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Dispatch an event to its handler.
    ///
    /// Types without a handler are logged and reported as `Ignored`; they
    /// never fail the dispatch.
    pub async fn dispatch(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
        match self.handlers.get(&event.kind()) {
            Some(handler) => handler.handle(event).await,
            None => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Unhandled event type"
                );
                Ok(ReconcileOutcome::Ignored {
                    event_type: event.event_type.clone(),
                })
            }
        }
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base * 2^(retry-1), capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Result of handing one event to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedEvent {
    Reconciled(ReconcileOutcome),
    /// The ledger already holds a final outcome for this event id.
    AlreadyProcessed,
}

/// Processes acknowledged events with replay protection and bounded retry.
pub struct WebhookProcessor {
    router: EventRouter,
    repository: Arc<dyn WebhookEventRepository>,
    retry: RetryPolicy,
}

impl WebhookProcessor {
    pub fn new(router: EventRouter, repository: Arc<dyn WebhookEventRepository>) -> Self {
        Self {
            router,
            repository,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reconcile one event.
    ///
    /// # Returns
    ///
    /// - `Ok(ProcessedEvent::Reconciled(_))` - event was applied or ignored
    /// - `Ok(ProcessedEvent::AlreadyProcessed)` - ledger shows a final outcome
    /// - `Err(_)` - reconciliation failed for good; a dead letter was recorded
    ///
    /// Ledger failures are logged and never block reconciliation, which is
    /// itself replay-safe.
    pub async fn process(&self, event: &WebhookEvent) -> Result<ProcessedEvent, ReconcileError> {
        match self.repository.find_by_event_id(&event.id).await {
            Ok(Some(record)) if record.outcome.is_final() => {
                debug!(event_id = %event.id, "Event already processed, skipping");
                return Ok(ProcessedEvent::AlreadyProcessed);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "Event ledger lookup failed");
            }
        }

        let mut attempts = 1;
        let result = loop {
            match self.router.dispatch(event).await {
                Err(err) if err.is_retryable() && attempts <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempts);
                    warn!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Reconciliation attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempts += 1;
                }
                other => break other,
            }
        };

        let record = match &result {
            Ok(ReconcileOutcome::Ignored { .. }) => {
                WebhookEventRecord::ignored(event, "no handler for event type")
            }
            Ok(_) => WebhookEventRecord::success(event, attempts),
            Err(err) => WebhookEventRecord::failed(event, err, attempts),
        };

        match self.repository.save(record).await {
            Ok(SaveResult::AlreadyExists) => {
                debug!(event_id = %event.id, "Event outcome recorded concurrently elsewhere");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "Failed to record event outcome");
            }
        }

        match result {
            Ok(outcome) => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    outcome = ?outcome,
                    "Event reconciled"
                );
                Ok(ProcessedEvent::Reconciled(outcome))
            }
            Err(err) => {
                error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    attempts,
                    error_code = err.error_code(),
                    error = %err,
                    "Reconciliation failed, event dead-lettered"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::event::WebhookEventBuilder;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::EventOutcome;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::RwLock;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockLedger {
        records: RwLock<HashMap<String, WebhookEventRecord>>,
        fail_lookups: bool,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
                fail_lookups: false,
            }
        }

        fn failing_lookups() -> Self {
            Self {
                fail_lookups: true,
                ..Self::new()
            }
        }

        async fn outcome_of(&self, event_id: &str) -> Option<EventOutcome> {
            self.records.read().await.get(event_id).map(|r| r.outcome)
        }
    }

    #[async_trait]
    impl WebhookEventRepository for MockLedger {
        async fn find_by_event_id(
            &self,
            event_id: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            if self.fail_lookups {
                return Err(DomainError::new(ErrorCode::DatabaseError, "ledger down"));
            }
            Ok(self.records.read().await.get(event_id).cloned())
        }

        async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
            let mut records = self.records.write().await;
            let result = if records.contains_key(&record.event_id) {
                SaveResult::Replaced
            } else {
                SaveResult::Inserted
            };
            records.insert(record.event_id.clone(), record);
            Ok(result)
        }

        async fn list_failed(&self, _limit: usize) -> Result<Vec<WebhookEventRecord>, DomainError> {
            Ok(Vec::new())
        }

        async fn delete_before(&self, _timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    struct ScriptedHandler {
        kinds: Vec<EventKind>,
        script: Mutex<VecDeque<Result<ReconcileOutcome, ReconcileError>>>,
        calls: AtomicU32,
    }

    impl ScriptedHandler {
        fn new(
            kinds: Vec<EventKind>,
            script: Vec<Result<ReconcileOutcome, ReconcileError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                kinds,
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookEventHandler for ScriptedHandler {
        fn handles(&self) -> Vec<EventKind> {
            self.kinds.clone()
        }

        async fn handle(&self, _event: &WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(unchanged()))
        }
    }

    fn email() -> EmailAddress {
        EmailAddress::parse("a@b.com").unwrap()
    }

    fn unchanged() -> ReconcileOutcome {
        ReconcileOutcome::Unchanged { email: email() }
    }

    fn timeout() -> ReconcileError {
        ReconcileError::SnapshotTimeout {
            subscription_id: "sub_1".to_string(),
            timeout_ms: 10,
        }
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn invoice_event(id: &str) -> WebhookEvent {
        WebhookEventBuilder::new().id(id).event_type("invoice.paid").build()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Router Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn router_dispatches_to_registered_handler() {
        let handler = ScriptedHandler::new(vec![EventKind::InvoicePaid], vec![]);
        let router = EventRouter::new().register(handler.clone());

        let outcome = router.dispatch(&invoice_event("evt_1")).await.unwrap();

        assert_eq!(outcome, unchanged());
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn router_ignores_unknown_types_without_error() {
        let handler = ScriptedHandler::new(vec![EventKind::InvoicePaid], vec![]);
        let router = EventRouter::new().register(handler.clone());
        let event = WebhookEventBuilder::new().event_type("charge.refunded").build();

        let outcome = router.dispatch(&event).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Ignored {
                event_type: "charge.refunded".to_string()
            }
        );
        assert_eq!(handler.call_count(), 0);
    }

    #[test]
    fn router_registers_every_declared_kind() {
        let handler = ScriptedHandler::new(
            vec![EventKind::SubscriptionUpdated, EventKind::SubscriptionDeleted],
            vec![],
        );
        let router = EventRouter::new().register(handler);

        assert!(router.handles(EventKind::SubscriptionUpdated));
        assert!(router.handles(EventKind::SubscriptionDeleted));
        assert!(!router.handles(EventKind::InvoicePaid));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Retry Policy Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Processor Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn processor_records_success() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(vec![EventKind::InvoicePaid], vec![]);
        let processor = WebhookProcessor::new(EventRouter::new().register(handler), ledger.clone());

        let result = processor.process(&invoice_event("evt_1")).await.unwrap();

        assert_eq!(result, ProcessedEvent::Reconciled(unchanged()));
        assert_eq!(ledger.outcome_of("evt_1").await, Some(EventOutcome::Success));
    }

    #[tokio::test]
    async fn processor_skips_already_processed_event() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(vec![EventKind::InvoicePaid], vec![]);
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger.clone());

        processor.process(&invoice_event("evt_1")).await.unwrap();
        let second = processor.process(&invoice_event("evt_1")).await.unwrap();

        assert_eq!(second, ProcessedEvent::AlreadyProcessed);
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn processor_records_ignored_events() {
        let ledger = Arc::new(MockLedger::new());
        let processor = WebhookProcessor::new(EventRouter::new(), ledger.clone());
        let event = WebhookEventBuilder::new()
            .id("evt_x")
            .event_type("customer.created")
            .build();

        let result = processor.process(&event).await.unwrap();

        assert!(matches!(result, ProcessedEvent::Reconciled(o) if o.is_ignored()));
        assert_eq!(ledger.outcome_of("evt_x").await, Some(EventOutcome::Ignored));
    }

    #[tokio::test]
    async fn processor_retries_transient_failures() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(
            vec![EventKind::InvoicePaid],
            vec![Err(timeout()), Err(timeout()), Ok(unchanged())],
        );
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger.clone())
                .with_retry_policy(fast_retry(3));

        let result = processor.process(&invoice_event("evt_1")).await;

        assert!(result.is_ok());
        assert_eq!(handler.call_count(), 3);
        let record = ledger.records.read().await.get("evt_1").cloned().unwrap();
        assert_eq!(record.attempts, 3);
    }

    #[tokio::test]
    async fn processor_dead_letters_after_exhausting_retries() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(
            vec![EventKind::InvoicePaid],
            vec![Err(timeout()), Err(timeout()), Err(timeout())],
        );
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger.clone())
                .with_retry_policy(fast_retry(2));

        let result = processor.process(&invoice_event("evt_1")).await;

        assert!(matches!(result, Err(ReconcileError::SnapshotTimeout { .. })));
        assert_eq!(handler.call_count(), 3);
        assert_eq!(ledger.outcome_of("evt_1").await, Some(EventOutcome::Failed));
    }

    #[tokio::test]
    async fn processor_does_not_retry_permanent_failures() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(
            vec![EventKind::SubscriptionUpdated],
            vec![Err(ReconcileError::AccountNotFound(email()))],
        );
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger.clone())
                .with_retry_policy(fast_retry(3));
        let event = WebhookEventBuilder::new()
            .id("evt_2")
            .event_type("customer.subscription.updated")
            .build();

        let result = processor.process(&event).await;

        assert!(matches!(result, Err(ReconcileError::AccountNotFound(_))));
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn redelivered_dead_letter_is_reprocessed() {
        let ledger = Arc::new(MockLedger::new());
        let handler = ScriptedHandler::new(
            vec![EventKind::InvoicePaid],
            vec![Err(ReconcileError::SnapshotNotFound("sub_1".to_string()))],
        );
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger.clone())
                .with_retry_policy(RetryPolicy::none());

        assert!(processor.process(&invoice_event("evt_1")).await.is_err());
        let second = processor.process(&invoice_event("evt_1")).await.unwrap();

        assert_eq!(second, ProcessedEvent::Reconciled(unchanged()));
        assert_eq!(ledger.outcome_of("evt_1").await, Some(EventOutcome::Success));
    }

    #[tokio::test]
    async fn ledger_outage_does_not_block_reconciliation() {
        let ledger = Arc::new(MockLedger::failing_lookups());
        let handler = ScriptedHandler::new(vec![EventKind::InvoicePaid], vec![]);
        let processor =
            WebhookProcessor::new(EventRouter::new().register(handler.clone()), ledger);

        let result = processor.process(&invoice_event("evt_1")).await;

        assert!(result.is_ok());
        assert_eq!(handler.call_count(), 1);
    }
}
