//! Handler for `invoice.paid` events.

use std::sync::Arc;

use async_trait::async_trait;

use super::reconciliation_engine::ReconciliationEngine;
use crate::domain::billing::{
    EventKind, InvoicePaidPayload, ReconcileError, ReconcileOutcome, WebhookEvent,
    WebhookEventHandler,
};

pub struct InvoicePaidHandler {
    engine: Arc<ReconciliationEngine>,
}

impl InvoicePaidHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl WebhookEventHandler for InvoicePaidHandler {
    fn handles(&self) -> Vec<EventKind> {
        vec![EventKind::InvoicePaid]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<ReconcileOutcome, ReconcileError> {
        let payload = InvoicePaidPayload::decode(event)?;
        self.engine.reconcile_invoice_paid(&payload).await
    }
}
