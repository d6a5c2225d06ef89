//! Integration tests for the webhook HTTP endpoint.
//!
//! These tests drive the full axum router:
//! 1. Origin allow-list and signature checks reject before acknowledgment
//! 2. Body cap maps to 503
//! 3. Verified events are acknowledged and reconciled in the background
//!
//! Uses in-memory adapters and a mock subscription source.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_reconciler::adapters::directory::InMemoryUserDirectory;
use billing_reconciler::adapters::http::{app_router, TrustGate, WebhookAppState};
use billing_reconciler::adapters::notifier::LoggingNotifier;
use billing_reconciler::adapters::stripe::MockSubscriptionSource;
use billing_reconciler::adapters::{
    Acknowledger, InMemoryWebhookEventRepository, QueueConfig, ReconciliationQueue,
};
use billing_reconciler::application::{billing_router, ReconciliationEngine};
use billing_reconciler::domain::billing::{
    sign_payload, OriginAllowList, RetryPolicy, SubscriptionSnapshot, SubscriptionStatus,
    WebhookProcessor, WebhookVerifier,
};
use billing_reconciler::domain::foundation::EmailAddress;
use billing_reconciler::ports::{EventOutcome, UserDirectory, WebhookEventRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "whsec_integration_secret";
const ALLOWED_PEER: &str = "3.18.12.63:443";
const PERIOD_END: i64 = 1_700_000_000;

struct TestApp {
    router: Router,
    directory: Arc<InMemoryUserDirectory>,
    notifier: Arc<LoggingNotifier>,
    ledger: Arc<InMemoryWebhookEventRepository>,
}

fn build_app(peer: &str, configure: impl FnOnce(TrustGate) -> TrustGate) -> TestApp {
    let directory = Arc::new(InMemoryUserDirectory::new());
    let notifier = Arc::new(LoggingNotifier::new());
    let source = Arc::new(MockSubscriptionSource::new());
    source.add_snapshot(SubscriptionSnapshot::new(
        "sub_1",
        SubscriptionStatus::Active,
        PERIOD_END,
    ));
    let ledger = Arc::new(InMemoryWebhookEventRepository::new());

    let engine = Arc::new(ReconciliationEngine::new(
        directory.clone(),
        notifier.clone(),
        source,
    ));
    let processor = Arc::new(
        WebhookProcessor::new(billing_router(engine), ledger.clone())
            .with_retry_policy(RetryPolicy::none()),
    );
    let (queue, _workers) =
        ReconciliationQueue::start(processor, QueueConfig::default().with_workers(2));

    let gate = configure(TrustGate::new(
        OriginAllowList::processor_defaults(),
        WebhookVerifier::new(SecretString::new(SECRET.to_string())),
    ));
    let state = WebhookAppState::new(gate, Acknowledger::new(queue, ledger.clone()));

    let peer: SocketAddr = peer.parse().unwrap();
    let router = app_router(state, Duration::from_secs(5)).layer(MockConnectInfo(peer));

    TestApp {
        router,
        directory,
        notifier,
        ledger,
    }
}

fn default_app() -> TestApp {
    build_app(ALLOWED_PEER, |gate| gate)
}

fn invoice_paid(event_id: &str, email: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "object": "event",
        "type": "invoice.paid",
        "created": 1_700_000_000,
        "livemode": false,
        "data": {
            "object": {
                "object": "invoice",
                "customer_email": email,
                "customer_name": "Ada Lovelace",
                "subscription": "sub_1"
            }
        }
    }))
    .unwrap()
}

fn signed_post(body: Vec<u8>) -> Request<Body> {
    let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), &body);
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("Stripe-Signature", header)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn eventually_recorded(
    ledger: &InMemoryWebhookEventRepository,
    event_id: &str,
) -> Option<EventOutcome> {
    for _ in 0..200 {
        if let Some(record) = ledger.find_by_event_id(event_id).await.unwrap() {
            return Some(record.outcome);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::parse(raw).unwrap()
}

// =============================================================================
// Liveness
// =============================================================================

#[tokio::test]
async fn ping_returns_pong() {
    let app = default_app();

    let response = app
        .router
        .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Pong!");
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn request_from_unlisted_origin_is_rejected_without_reconciliation() {
    let app = build_app("127.0.0.1:50000", |gate| gate);

    let response = app
        .router
        .oneshot(signed_post(invoice_paid("evt_origin", "ada@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "ORIGIN_REJECTED");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.ledger.is_empty().await);
    assert!(app.directory.is_empty());
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let app = default_app();
    let body = invoice_paid("evt_tamper", "ada@example.com");
    let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), &body);
    let tampered = invoice_paid("evt_tamper", "mallory@example.com");

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header("Stripe-Signature", header)
                .body(Body::from(tampered))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "SIGNATURE_INVALID");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn stale_signature_is_rejected() {
    let app = default_app();
    let body = invoice_paid("evt_stale", "ada@example.com");
    let header = sign_payload(SECRET, chrono::Utc::now().timestamp() - 3_600, &body);

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header("Stripe-Signature", header)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "SIGNATURE_INVALID");
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = default_app();

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .body(Body::from(invoice_paid("evt_nosig", "ada@example.com")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_service_unavailable() {
    let app = build_app(ALLOWED_PEER, |gate| gate.with_max_body_bytes(64));

    let response = app
        .router
        .oneshot(signed_post(invoice_paid("evt_big", "ada@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error_code"], "BODY_TOO_LARGE");
}

#[tokio::test]
async fn authentic_body_that_is_not_an_event_is_rejected() {
    let app = default_app();

    let response = app
        .router
        .oneshot(signed_post(br#"{"hello":"world"}"#.to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "PAYLOAD_DECODE_ERROR");
}

// =============================================================================
// Acknowledgment and Reconciliation
// =============================================================================

#[tokio::test]
async fn paid_invoice_is_acknowledged_then_provisions_account() {
    let app = default_app();

    let response = app
        .router
        .oneshot(signed_post(invoice_paid("evt_paid", "Ada@Example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "received": true }));

    assert_eq!(
        eventually_recorded(&app.ledger, "evt_paid").await,
        Some(EventOutcome::Success)
    );
    let record = app
        .directory
        .lookup(&email("ada@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.subscription_status, SubscriptionStatus::Active);
    assert_eq!(record.expire_at_millis, PERIOD_END * 1000 + 43_200_000);
    assert_eq!(app.notifier.delivered(), vec![email("ada@example.com")]);
}

#[tokio::test]
async fn redelivered_invoice_provisions_once() {
    let app = default_app();

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(signed_post(invoice_paid("evt_dup", "ada@example.com")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(
        eventually_recorded(&app.ledger, "evt_dup").await,
        Some(EventOutcome::Success)
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.directory.len(), 1);
    assert_eq!(app.notifier.delivered().len(), 1);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged_and_ignored() {
    let app = default_app();
    let body = serde_json::to_vec(&json!({
        "id": "evt_refund",
        "type": "charge.refunded",
        "data": { "object": { "amount": 500 } }
    }))
    .unwrap();

    let response = app.router.oneshot(signed_post(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        eventually_recorded(&app.ledger, "evt_refund").await,
        Some(EventOutcome::Ignored)
    );
    assert!(app.directory.is_empty());
}

#[tokio::test]
async fn forwarded_origin_is_used_behind_trusted_proxy() {
    let app = build_app("10.0.0.5:40000", |gate| gate.with_forwarded_headers(true));
    let body = invoice_paid("evt_proxy", "ada@example.com");
    let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), &body);

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header("Stripe-Signature", header)
                .header("X-Forwarded-For", "3.130.192.231, 10.0.0.5")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forwarded_header_is_ignored_without_trusted_proxy() {
    let app = build_app("10.0.0.5:40000", |gate| gate);
    let body = invoice_paid("evt_spoof", "ada@example.com");
    let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), &body);

    let response = app
        .router
        .oneshot(
            Request::post("/webhook")
                .header("Stripe-Signature", header)
                .header("X-Forwarded-For", "3.130.192.231")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
