//! Webhook HTTP adapter.
//!
//! The only inbound surface: the processor's webhook deliveries plus a
//! liveness check.

mod dto;
mod handlers;
mod routes;
mod trust_gate;

pub use dto::{AckResponse, ErrorResponse};
pub use handlers::{ping, receive_webhook, WebhookApiError, WebhookAppState};
pub use routes::webhook_routes;
pub use trust_gate::{TrustGate, DEFAULT_MAX_BODY_BYTES, DEFAULT_SIGNATURE_HEADER};
