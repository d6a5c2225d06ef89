//! Acknowledger - hands verified events to the reconciliation queue.
//!
//! The HTTP handler must answer the processor quickly. The event is placed on
//! its shard without waiting, so acknowledgment order is queue order and the
//! caller never waits for reconciliation. An event the queue cannot take is
//! recorded as a dead letter instead of being buffered elsewhere.

use std::sync::Arc;

use tracing::error;

use super::reconciliation_queue::{ReconciliationQueue, Rejected};
use crate::domain::billing::WebhookEvent;
use crate::ports::{WebhookEventRecord, WebhookEventRepository};

#[derive(Clone)]
pub struct Acknowledger {
    queue: ReconciliationQueue,
    ledger: Arc<dyn WebhookEventRepository>,
}

impl Acknowledger {
    pub fn new(queue: ReconciliationQueue, ledger: Arc<dyn WebhookEventRepository>) -> Self {
        Self { queue, ledger }
    }

    /// Schedule reconciliation of a verified event.
    ///
    /// Completes once the event is queued or dead-lettered, never after
    /// reconciliation.
    pub async fn acknowledge(&self, event: WebhookEvent) {
        let Rejected { event, error } = match self.queue.try_enqueue(event) {
            Ok(_) => return,
            Err(rejected) => rejected,
        };

        error!(
            event_id = %event.id,
            event_type = %event.event_type,
            error_code = error.error_code(),
            error = %error,
            "Reconciliation queue rejected event, dead-lettering"
        );
        if let Err(err) = self
            .ledger
            .save(WebhookEventRecord::failed(&event, &error, 0))
            .await
        {
            error!(event_id = %event.id, error = %err, "Failed to record rejected event");
        }
    }
}
