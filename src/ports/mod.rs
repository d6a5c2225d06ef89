//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `UserDirectory` - Account lookup, create and update keyed by email
//! - `Notifier` - Delivery of provisioning credentials
//! - `SubscriptionSource` - Live subscription snapshots from the payment processor
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Processed-event ledger and dead letters

mod notifier;
mod subscription_source;
mod user_directory;
mod webhook_event_repository;

pub use notifier::Notifier;
pub use subscription_source::{SourceError, SourceErrorCode, SubscriptionSource};
pub use user_directory::UserDirectory;
pub use webhook_event_repository::{
    EventOutcome, SaveResult, WebhookEventRecord, WebhookEventRepository,
};
