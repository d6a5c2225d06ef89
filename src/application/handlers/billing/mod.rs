//! Billing handlers.
//!
//! Webhook event handlers that reconcile processor events into account
//! records through the `ReconciliationEngine`:
//!
//! - `invoice.paid` - upsert with snapshot status and grace-period expiry
//! - `customer.subscription.updated` / `.deleted` - status-only update

mod invoice_paid;
mod reconciliation_engine;
mod subscription_changed;

pub use invoice_paid::InvoicePaidHandler;
pub use reconciliation_engine::{ReconciliationEngine, DEFAULT_SNAPSHOT_TIMEOUT};
pub use subscription_changed::SubscriptionChangedHandler;

use std::sync::Arc;

use crate::domain::billing::EventRouter;

/// Router with every billing handler registered.
pub fn billing_router(engine: Arc<ReconciliationEngine>) -> EventRouter {
    EventRouter::new()
        .register(Arc::new(InvoicePaidHandler::new(Arc::clone(&engine))))
        .register(Arc::new(SubscriptionChangedHandler::new(engine)))
}
