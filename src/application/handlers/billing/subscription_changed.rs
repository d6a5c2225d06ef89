//! Handler for `customer.subscription.updated` and `.deleted` events.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::reconciliation_engine::ReconciliationEngine;
use crate::domain::billing::{
    EventKind, ReconcileError, ReconcileOutcome, SubscriptionChangedPayload, WebhookEvent,
    WebhookEventHandler,
};

pub struct SubscriptionChangedHandler {
    engine: Arc<ReconciliationEngine>,
}

impl SubscriptionChangedHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionChangedHandler {
    fn handles(&self) -> Vec<EventKind> {
        vec![EventKind::SubscriptionUpdated, EventKind::SubscriptionDeleted]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
        let payload = SubscriptionChangedPayload::decode(event)?;

        if let Some(details) = &payload.cancellation {
            // Recorded for churn analysis downstream; it does not affect the account.
            info!(
                event_id = %event.id,
                email = %payload.customer_email,
                reason = details.reason.as_deref().unwrap_or("-"),
                feedback = details.feedback.as_deref().unwrap_or("-"),
                "Subscription cancellation details"
            );
        }

        self.engine.reconcile_status_change(&payload).await
    }
}
