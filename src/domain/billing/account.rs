//! Account record reconciled from billing events.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::SubscriptionStatus;
use crate::domain::foundation::EmailAddress;

/// Initial credential handed to a newly provisioned account.
///
/// Debug output is redacted so records can be logged freely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisioningSecret(String);

impl ProvisioningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProvisioningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProvisioningSecret([REDACTED])")
    }
}

/// An account keyed by email.
///
/// Created on the first paid invoice for an unknown email and mutated in
/// place afterwards. Cancellation is a status, never a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub email: EmailAddress,
    pub provisioning_secret: ProvisioningSecret,
    pub subscription_status: SubscriptionStatus,
    pub expire_at_millis: i64,
}

impl AccountRecord {
    /// Applies a renewal: new status and a new expiry.
    ///
    /// Returns true if the record changed.
    pub fn apply_renewal(&mut self, status: SubscriptionStatus, expire_at_millis: i64) -> bool {
        let changed =
            self.subscription_status != status || self.expire_at_millis != expire_at_millis;
        self.subscription_status = status;
        self.expire_at_millis = expire_at_millis;
        changed
    }

    /// Applies a status-only change, leaving expiry untouched.
    ///
    /// Returns true if the record changed.
    pub fn apply_status(&mut self, status: SubscriptionStatus) -> bool {
        let changed = self.subscription_status != status;
        self.subscription_status = status;
        changed
    }
}

/// Fields needed to create an account. The directory supplies the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: EmailAddress,
    pub subscription_status: SubscriptionStatus,
    pub expire_at_millis: i64,
}

impl NewAccount {
    /// Materializes the record with the given secret.
    pub fn into_record(self, provisioning_secret: ProvisioningSecret) -> AccountRecord {
        AccountRecord {
            name: self.name,
            email: self.email,
            provisioning_secret,
            subscription_status: self.subscription_status,
            expire_at_millis: self.expire_at_millis,
        }
    }
}
