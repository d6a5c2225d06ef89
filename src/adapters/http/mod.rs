//! HTTP adapters - the axum application.

pub mod webhook;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use webhook::{TrustGate, WebhookAppState};

/// Build the complete application router with tracing and request timeout.
pub fn app_router(state: WebhookAppState, request_timeout: Duration) -> Router {
    webhook::webhook_routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
