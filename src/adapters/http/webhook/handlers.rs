//! HTTP handlers for the webhook endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Json, State};
use axum::http::Request;
use axum::response::IntoResponse;
use tracing::{info, warn};

use super::dto::{AckResponse, ErrorResponse};
use super::trust_gate::TrustGate;
use crate::adapters::events::Acknowledger;
use crate::domain::billing::WebhookError;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub gate: Arc<TrustGate>,
    pub acknowledger: Acknowledger,
}

impl WebhookAppState {
    pub fn new(gate: TrustGate, acknowledger: Acknowledger) -> Self {
        Self {
            gate: Arc::new(gate),
            acknowledger,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Receive a processor event.
///
/// Responds as soon as the event is verified; reconciliation happens in the
/// background.
pub async fn receive_webhook(
    State(state): State<WebhookAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
) -> Result<impl IntoResponse, WebhookApiError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);

    let event = state.gate.admit(peer, request).await?;

    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        livemode = event.livemode,
        "Webhook event acknowledged"
    );
    state.acknowledger.acknowledge(event).await;

    Ok(Json(AckResponse::received()))
}

/// GET /ping - Liveness check.
pub async fn ping() -> &'static str {
    "Pong!"
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook rejections to HTTP responses.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        warn!(
            error_code = self.0.error_code(),
            http_status = status.as_u16(),
            error = %self.0,
            "Webhook request rejected"
        );
        let body = ErrorResponse::new(self.0.error_code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
