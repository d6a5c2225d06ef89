//! Billing domain - account records reconciled from payment processor webhooks.
//!
//! # Module Structure
//!
//! - `status` - the processor's closed set of subscription statuses
//! - `account` - the account record keyed by email
//! - `expiry` - grace-period expiry computation
//! - `event` / `payloads` - event envelope and typed payloads
//! - `origin` / `webhook_verifier` - the webhook trust boundary
//! - `webhook_processor` - routing, retry and outcome recording

mod account;
mod credentials;
mod event;
mod expiry;
mod origin;
mod payloads;
mod reconcile_errors;
mod snapshot;
mod status;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use account::{AccountRecord, NewAccount, ProvisioningSecret};
pub use credentials::generate_temporary_password;
pub use event::{EventData, EventKind, WebhookEvent};
pub use expiry::{GracePeriod, DEFAULT_GRACE_PERIOD_MILLIS};
pub use origin::{OriginAllowList, PROCESSOR_WEBHOOK_IPS};
pub use payloads::{CancellationDetails, InvoicePaidPayload, SubscriptionChangedPayload};
pub use reconcile_errors::ReconcileError;
pub use snapshot::SubscriptionSnapshot;
pub use status::{SubscriptionStatus, UnknownStatus};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    EventRouter, ProcessedEvent, ReconcileOutcome, RetryPolicy, WebhookEventHandler,
    WebhookProcessor,
};
pub use webhook_verifier::{sign_payload, SignatureHeader, WebhookVerifier, DEFAULT_TOLERANCE_SECS};

#[cfg(test)]
pub use event::WebhookEventBuilder;
