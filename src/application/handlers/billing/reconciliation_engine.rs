//! ReconciliationEngine - turns decoded billing events into account state.
//!
//! `invoice.paid` is an upsert keyed by email whose status and expiry come from
//! a freshly fetched subscription snapshot. Status events overwrite the status
//! of an existing account and nothing else.
//!
//! The engine assumes calls for the same email are serialized by its caller;
//! it performs plain lookup-then-write.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::billing::{
    AccountRecord, GracePeriod, InvoicePaidPayload, NewAccount, ReconcileError, ReconcileOutcome,
    SubscriptionChangedPayload, SubscriptionSnapshot, SubscriptionStatus,
};
use crate::domain::foundation::ErrorCode;
use crate::ports::{Notifier, SourceErrorCode, SubscriptionSource, UserDirectory};

/// Default bound on a snapshot fetch.
pub const DEFAULT_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ReconciliationEngine {
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    subscriptions: Arc<dyn SubscriptionSource>,
    grace_period: GracePeriod,
    snapshot_timeout: Duration,
}

impl ReconciliationEngine {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        subscriptions: Arc<dyn SubscriptionSource>,
    ) -> Self {
        Self {
            directory,
            notifier,
            subscriptions,
            grace_period: GracePeriod::default(),
            snapshot_timeout: DEFAULT_SNAPSHOT_TIMEOUT,
        }
    }

    pub fn with_grace_period(mut self, grace_period: GracePeriod) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_snapshot_timeout(mut self, timeout: Duration) -> Self {
        self.snapshot_timeout = timeout;
        self
    }

    /// Fetches the live subscription, bounded by the snapshot timeout.
    pub async fn fetch_snapshot(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, ReconcileError> {
        let fetch = self.subscriptions.fetch_subscription_snapshot(subscription_id);

        match tokio::time::timeout(self.snapshot_timeout, fetch).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(err)) if err.code == SourceErrorCode::NotFound => {
                Err(ReconcileError::SnapshotNotFound(subscription_id.to_string()))
            }
            Ok(Err(err)) => Err(ReconcileError::SnapshotFetch {
                subscription_id: subscription_id.to_string(),
                message: err.to_string(),
                retryable: err.retryable,
            }),
            Err(_) => Err(ReconcileError::SnapshotTimeout {
                subscription_id: subscription_id.to_string(),
                timeout_ms: self.snapshot_timeout.as_millis() as u64,
            }),
        }
    }

    /// Applies a paid invoice.
    ///
    /// Creates the account (and sends credentials once) for an unknown email,
    /// otherwise overwrites status and expiry.
    pub async fn reconcile_invoice_paid(
        &self,
        payload: &InvoicePaidPayload,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let snapshot = self.fetch_snapshot(&payload.subscription_id).await?;
        let expire_at_millis = self.grace_period.expiry_for(&snapshot);

        debug!(
            email = %payload.customer_email,
            subscription_id = %snapshot.subscription_id,
            status = %snapshot.status,
            expire_at_millis,
            "Fetched subscription snapshot"
        );

        if let Some(record) = self.directory.lookup(&payload.customer_email).await? {
            return self.renew(record, snapshot.status, expire_at_millis).await;
        }

        let account = NewAccount {
            name: payload.customer_name.clone(),
            email: payload.customer_email.clone(),
            subscription_status: snapshot.status,
            expire_at_millis,
        };

        match self.directory.create(account).await {
            Ok(record) => {
                info!(
                    email = %record.email,
                    status = %record.subscription_status,
                    "Account created"
                );
                self.notifier
                    .send_provisioning_credentials(&record.email, &record.provisioning_secret)
                    .await
                    .map_err(|err| ReconcileError::Notification {
                        email: record.email.clone(),
                        message: err.to_string(),
                    })?;
                Ok(ReconcileOutcome::AccountCreated {
                    email: record.email,
                })
            }
            Err(err) if err.code == ErrorCode::AccountAlreadyExists => {
                // Created by someone else between lookup and create.
                let record = self
                    .directory
                    .lookup(&payload.customer_email)
                    .await?
                    .ok_or(ReconcileError::Directory(err))?;
                self.renew(record, snapshot.status, expire_at_millis).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn renew(
        &self,
        mut record: AccountRecord,
        status: SubscriptionStatus,
        expire_at_millis: i64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if !record.apply_renewal(status, expire_at_millis) {
            return Ok(ReconcileOutcome::Unchanged {
                email: record.email,
            });
        }

        self.directory.update(&record).await?;
        info!(
            email = %record.email,
            status = %status,
            expire_at_millis,
            "Account renewed"
        );
        Ok(ReconcileOutcome::AccountRenewed {
            email: record.email,
        })
    }

    /// Applies a subscription status change to an existing account.
    ///
    /// Expiry is left untouched; only paid invoices move it.
    pub async fn reconcile_status_change(
        &self,
        payload: &SubscriptionChangedPayload,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut record = self
            .directory
            .lookup(&payload.customer_email)
            .await?
            .ok_or_else(|| ReconcileError::AccountNotFound(payload.customer_email.clone()))?;

        let previous = record.subscription_status;
        if !record.apply_status(payload.status) {
            return Ok(ReconcileOutcome::Unchanged {
                email: record.email,
            });
        }

        self.directory.update(&record).await?;
        info!(
            email = %record.email,
            from = %previous,
            to = %payload.status,
            "Account status updated"
        );
        Ok(ReconcileOutcome::StatusUpdated {
            email: record.email,
            status: payload.status,
        })
    }
}
