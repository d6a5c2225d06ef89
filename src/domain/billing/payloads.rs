//! Typed payloads decoded from event objects.
//!
//! The wire structs mirror the processor's invoice and subscription objects
//! loosely: every field is optional on the wire, and requiredness is checked
//! while converting into the domain payload so decode errors name the field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::{EventKind, WebhookEvent};
use super::reconcile_errors::ReconcileError;
use super::status::SubscriptionStatus;
use crate::domain::foundation::EmailAddress;

/// Reference to another processor object: bare id or expanded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectRef {
    Id(String),
    Expanded { id: String },
}

impl ObjectRef {
    fn into_id(self) -> String {
        match self {
            ObjectRef::Id(id) | ObjectRef::Expanded { id } => id,
        }
    }
}

/// Raw customer email that identifies the account an event touches.
///
/// Invoices carry `customer_email`. Subscription objects prefer an expanded
/// `customer.email` over a top-level `customer_email`. Both the decoders and
/// the queue's routing key read the email through here.
pub(super) fn raw_customer_email(kind: EventKind, object: &Value) -> Option<&str> {
    let top_level = || object.get("customer_email").and_then(Value::as_str);
    match kind {
        EventKind::InvoicePaid => top_level(),
        EventKind::SubscriptionUpdated | EventKind::SubscriptionDeleted => object
            .get("customer")
            .and_then(|customer| customer.get("email"))
            .and_then(Value::as_str)
            .or_else(top_level),
        EventKind::Other => None,
    }
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    customer_name: Option<String>,
    subscription: Option<ObjectRef>,
    parent: Option<InvoiceParent>,
}

/// Newer API versions move the subscription under `parent.subscription_details`.
#[derive(Debug, Deserialize)]
struct InvoiceParent {
    subscription_details: Option<InvoiceSubscriptionDetails>,
}

#[derive(Debug, Deserialize)]
struct InvoiceSubscriptionDetails {
    subscription: Option<ObjectRef>,
}

/// Decoded `invoice.paid` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePaidPayload {
    pub customer_email: EmailAddress,
    pub customer_name: String,
    pub subscription_id: String,
}

impl InvoicePaidPayload {
    pub fn decode(event: &WebhookEvent) -> Result<Self, ReconcileError> {
        let decode_err = |reason: String| ReconcileError::payload_decode(&event.event_type, reason);

        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| decode_err(e.to_string()))?;

        let customer_email = raw_customer_email(EventKind::InvoicePaid, &event.data.object)
            .ok_or_else(|| decode_err("missing customer_email".to_string()))
            .and_then(|raw| EmailAddress::parse(raw).map_err(|e| decode_err(e.to_string())))?;

        let subscription_id = invoice
            .subscription
            .or_else(|| {
                invoice
                    .parent
                    .and_then(|parent| parent.subscription_details)
                    .and_then(|details| details.subscription)
            })
            .map(ObjectRef::into_id)
            .ok_or_else(|| decode_err("invoice is not tied to a subscription".to_string()))?;

        Ok(Self {
            customer_email,
            customer_name: invoice.customer_name.unwrap_or_default(),
            subscription_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: Option<String>,
    status: Option<String>,
    cancellation_details: Option<CancellationDetails>,
}

/// Why a subscription was canceled, when the customer or processor says so.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CancellationDetails {
    pub reason: Option<String>,
    /// e.g. "too_expensive", "missing_features", "switched_service".
    pub feedback: Option<String>,
    pub comment: Option<String>,
}

impl CancellationDetails {
    pub fn is_empty(&self) -> bool {
        self.reason.is_none() && self.feedback.is_none() && self.comment.is_none()
    }
}

/// Decoded `customer.subscription.updated` / `.deleted` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChangedPayload {
    pub subscription_id: Option<String>,
    pub customer_email: EmailAddress,
    pub status: SubscriptionStatus,
    pub cancellation: Option<CancellationDetails>,
}

impl SubscriptionChangedPayload {
    pub fn decode(event: &WebhookEvent) -> Result<Self, ReconcileError> {
        let decode_err = |reason: String| ReconcileError::payload_decode(&event.event_type, reason);

        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| decode_err(e.to_string()))?;

        let customer_email = raw_customer_email(EventKind::SubscriptionUpdated, &event.data.object)
            .ok_or_else(|| decode_err("missing customer email".to_string()))
            .and_then(|raw| EmailAddress::parse(raw).map_err(|e| decode_err(e.to_string())))?;

        let status = subscription
            .status
            .ok_or_else(|| decode_err("missing status".to_string()))?
            .parse::<SubscriptionStatus>()
            .map_err(|e| decode_err(e.to_string()))?;

        Ok(Self {
            subscription_id: subscription.id,
            customer_email,
            status,
            cancellation: subscription
                .cancellation_details
                .filter(|details| !details.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::event::WebhookEventBuilder;
    use serde_json::json;

    fn invoice_event(object: serde_json::Value) -> WebhookEvent {
        WebhookEventBuilder::new().object(object).build()
    }

    fn subscription_event(object: serde_json::Value) -> WebhookEvent {
        WebhookEventBuilder::new()
            .event_type("customer.subscription.deleted")
            .object(object)
            .build()
    }

    // ══════════════════════════════════════════════════════════════
    // InvoicePaidPayload Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn decodes_invoice_with_subscription_id() {
        let payload = InvoicePaidPayload::decode(&invoice_event(json!({
            "object": "invoice",
            "customer_email": "A@B.com",
            "customer_name": "Ada",
            "subscription": "sub_123",
            "status": "paid"
        })))
        .unwrap();

        assert_eq!(payload.customer_email.as_str(), "a@b.com");
        assert_eq!(payload.customer_name, "Ada");
        assert_eq!(payload.subscription_id, "sub_123");
    }

    #[test]
    fn decodes_invoice_with_expanded_subscription() {
        let payload = InvoicePaidPayload::decode(&invoice_event(json!({
            "customer_email": "a@b.com",
            "subscription": {"id": "sub_456", "status": "active"}
        })))
        .unwrap();

        assert_eq!(payload.subscription_id, "sub_456");
        assert_eq!(payload.customer_name, "");
    }

    #[test]
    fn decodes_invoice_with_parent_subscription_details() {
        let payload = InvoicePaidPayload::decode(&invoice_event(json!({
            "customer_email": "a@b.com",
            "parent": {"subscription_details": {"subscription": "sub_789"}}
        })))
        .unwrap();

        assert_eq!(payload.subscription_id, "sub_789");
    }

    #[test]
    fn invoice_without_email_fails() {
        let err = InvoicePaidPayload::decode(&invoice_event(json!({
            "customer_email": null,
            "subscription": "sub_1"
        })))
        .unwrap_err();

        assert!(matches!(err, ReconcileError::PayloadDecode { .. }));
        assert!(err.to_string().contains("customer_email"));
    }

    #[test]
    fn invoice_without_subscription_fails() {
        let err = InvoicePaidPayload::decode(&invoice_event(json!({
            "customer_email": "a@b.com"
        })))
        .unwrap_err();

        assert!(matches!(err, ReconcileError::PayloadDecode { .. }));
    }

    #[test]
    fn non_object_payload_fails() {
        let err = InvoicePaidPayload::decode(&invoice_event(json!("nope"))).unwrap_err();
        assert!(matches!(err, ReconcileError::PayloadDecode { .. }));
    }

    // ══════════════════════════════════════════════════════════════
    // SubscriptionChangedPayload Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn decodes_subscription_with_expanded_customer() {
        let payload = SubscriptionChangedPayload::decode(&subscription_event(json!({
            "id": "sub_1",
            "status": "canceled",
            "customer": {"id": "cus_1", "email": "a@b.com"},
            "cancellation_details": {"feedback": "too_expensive", "reason": "cancellation_requested", "comment": null}
        })))
        .unwrap();

        assert_eq!(payload.customer_email.as_str(), "a@b.com");
        assert_eq!(payload.status, SubscriptionStatus::Canceled);
        assert_eq!(payload.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(
            payload.cancellation.unwrap().feedback.as_deref(),
            Some("too_expensive")
        );
    }

    #[test]
    fn empty_cancellation_details_are_dropped() {
        let payload = SubscriptionChangedPayload::decode(&subscription_event(json!({
            "status": "active",
            "customer": {"email": "a@b.com"},
            "cancellation_details": {"feedback": null, "reason": null, "comment": null}
        })))
        .unwrap();

        assert!(payload.cancellation.is_none());
    }

    #[test]
    fn falls_back_to_top_level_customer_email() {
        let payload = SubscriptionChangedPayload::decode(&subscription_event(json!({
            "status": "past_due",
            "customer": "cus_1",
            "customer_email": "a@b.com"
        })))
        .unwrap();

        assert_eq!(payload.customer_email.as_str(), "a@b.com");
        assert_eq!(payload.status, SubscriptionStatus::PastDue);
    }

    #[test]
    fn unexpanded_customer_without_email_fails() {
        let err = SubscriptionChangedPayload::decode(&subscription_event(json!({
            "status": "active",
            "customer": "cus_1"
        })))
        .unwrap_err();

        assert!(err.to_string().contains("missing customer email"));
    }

    #[test]
    fn status_outside_closed_set_fails() {
        let err = SubscriptionChangedPayload::decode(&subscription_event(json!({
            "status": "paused",
            "customer": {"email": "a@b.com"}
        })))
        .unwrap_err();

        assert!(matches!(err, ReconcileError::PayloadDecode { .. }));
        assert!(err.to_string().contains("paused"));
    }
}
