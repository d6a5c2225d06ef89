//! Account expiry computation.

use serde::{Deserialize, Serialize};

use super::snapshot::SubscriptionSnapshot;

/// Twelve hours, in milliseconds.
pub const DEFAULT_GRACE_PERIOD_MILLIS: i64 = 43_200_000;

/// Buffer added past the billing period end before an account expires.
///
/// Invoices for the next period can settle hours after the current period
/// ends even when nothing is wrong with the payment method, so expiry is
/// never the bare period end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriod {
    millis: i64,
}

impl GracePeriod {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    /// `period_end_secs * 1000 + grace`.
    pub fn expire_at_millis(&self, current_period_end_secs: i64) -> i64 {
        current_period_end_secs
            .saturating_mul(1000)
            .saturating_add(self.millis)
    }

    /// Expiry for the given snapshot's current period.
    pub fn expiry_for(&self, snapshot: &SubscriptionSnapshot) -> i64 {
        self.expire_at_millis(snapshot.current_period_end_secs)
    }
}

impl Default for GracePeriod {
    fn default() -> Self {
        Self::from_millis(DEFAULT_GRACE_PERIOD_MILLIS)
    }
}
