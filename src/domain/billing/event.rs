//! Webhook event envelope.
//!
//! Only the fields needed for routing and auditing are captured; the
//! type-specific object stays raw until a handler decodes it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payloads::raw_customer_email;
use crate::domain::foundation::EmailAddress;

/// Type-tagged event as delivered by the payment processor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WebhookEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type tag (e.g., "invoice.paid"); selects the payload schema.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    pub data: EventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<Value>,
}

/// Event types this service reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InvoicePaid,
    SubscriptionUpdated,
    SubscriptionDeleted,
    /// Any type without a registered handler.
    Other,
}

impl EventKind {
    /// Parse event kind from the type tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "invoice.paid" => Self::InvoicePaid,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvoicePaid => "invoice.paid",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::Other => "other",
        }
    }
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_tag(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }

    /// Key that serializes reconciliation for this event.
    ///
    /// The normalized email of the account the payload decodes to, otherwise
    /// the event id. Events for the same account therefore always share a key.
    pub fn routing_key(&self) -> String {
        raw_customer_email(self.kind(), &self.data.object)
            .and_then(|raw| EmailAddress::parse(raw).ok())
            .map(String::from)
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Builder for creating test WebhookEvent instances.
#[cfg(test)]
pub struct WebhookEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: Value,
}

#[cfg(test)]
impl Default for WebhookEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "invoice.paid".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl WebhookEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> WebhookEvent {
        WebhookEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: EventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
