//! Mock subscription source for testing.
//!
//! Supports pre-configured snapshots, error injection, artificial latency and
//! call tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::billing::SubscriptionSnapshot;
use crate::ports::{SourceError, SubscriptionSource};

/// Mock subscription source for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockSubscriptionSource::new();
/// mock.add_snapshot(SubscriptionSnapshot::new("sub_1", SubscriptionStatus::Active, 1_700_000_000));
/// mock.fail_next(SourceError::network("connection reset"));
/// ```
#[derive(Clone, Default)]
pub struct MockSubscriptionSource {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    snapshots: HashMap<String, SubscriptionSnapshot>,
    /// Errors returned, in order, before snapshots are served again.
    queued_errors: Vec<SourceError>,
    latency: Option<Duration>,
    call_log: Vec<String>,
}

impl MockSubscriptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to the "processor".
    pub fn add_snapshot(&self, snapshot: SubscriptionSnapshot) {
        if let Ok(mut state) = self.inner.lock() {
            state
                .snapshots
                .insert(snapshot.subscription_id.clone(), snapshot);
        }
    }

    /// Fail the next call with the given error.
    pub fn fail_next(&self, error: SourceError) {
        if let Ok(mut state) = self.inner.lock() {
            state.queued_errors.push(error);
        }
    }

    /// Delay every response.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut state) = self.inner.lock() {
            state.latency = Some(latency);
        }
    }

    /// Subscription ids requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|state| state.call_log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SubscriptionSource for MockSubscriptionSource {
    async fn fetch_subscription_snapshot(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, SourceError> {
        let (latency, result) = {
            let mut state = self
                .inner
                .lock()
                .map_err(|_| SourceError::network("mock state poisoned"))?;
            state.call_log.push(subscription_id.to_string());

            let result = if state.queued_errors.is_empty() {
                state
                    .snapshots
                    .get(subscription_id)
                    .cloned()
                    .ok_or_else(|| SourceError::not_found("Subscription"))
            } else {
                Err(state.queued_errors.remove(0))
            };
            (state.latency, result)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    }
}
