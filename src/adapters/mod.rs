//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum webhook endpoint and trust gate
//! - `events` - acknowledgment, keyed reconciliation queue, event ledger
//! - `stripe` - subscription snapshots from the processor API
//! - `directory` - account storage (in-memory, PostgreSQL)
//! - `notifier` - credential delivery (log-only, Resend)

pub mod directory;
pub mod events;
pub mod http;
pub mod notifier;
pub mod stripe;

pub use events::{Acknowledger, InMemoryWebhookEventRepository, QueueConfig, ReconciliationQueue};
