//! Event adapters - from acknowledgment to reconciliation.
//!
//! - `Acknowledger` - spawns the enqueue so the HTTP response is not delayed
//! - `ReconciliationQueue` - worker shards keyed by account identity
//! - `InMemoryWebhookEventRepository` - processed-event ledger and dead letters

mod acknowledger;
mod in_memory_ledger;
mod reconciliation_queue;

pub use acknowledger::Acknowledger;
pub use in_memory_ledger::InMemoryWebhookEventRepository;
pub use reconciliation_queue::{QueueConfig, ReconciliationQueue, Rejected};
