//! Live subscription state fetched from the payment processor.

use serde::{Deserialize, Serialize};

use super::status::SubscriptionStatus;

/// Authoritative subscription state at the moment of reconciliation.
///
/// Always fetched fresh from the processor; never reconstructed from an
/// event payload, whose embedded status may lag behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
    /// End of the current billing period, in Unix seconds.
    pub current_period_end_secs: i64,
}

impl SubscriptionSnapshot {
    pub fn new(
        subscription_id: impl Into<String>,
        status: SubscriptionStatus,
        current_period_end_secs: i64,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            status,
            current_period_end_secs,
        }
    }
}
