//! Axum router configuration for webhook endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{ping, receive_webhook, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /webhook` - Receive processor events (origin and signature verified)
/// - `GET /ping` - Liveness check
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/ping", get(ping))
}
