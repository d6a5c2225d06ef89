//! Reconciliation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::billing::{GracePeriod, RetryPolicy, DEFAULT_GRACE_PERIOD_MILLIS};

/// Reconciliation configuration (grace period, workers, retries)
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Added to the billing period end to compute account expiry
    #[serde(default = "default_grace_period")]
    pub grace_period_millis: i64,

    /// Bound on each subscription snapshot fetch
    #[serde(default = "default_snapshot_timeout")]
    pub snapshot_timeout_secs: u64,

    /// Worker shards
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Buffered events per shard
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay; doubles per attempt
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

impl ReconciliationConfig {
    pub fn grace_period(&self) -> GracePeriod {
        GracePeriod::from_millis(self.grace_period_millis)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.snapshot_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// Validate reconciliation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.grace_period_millis < 0 {
            return Err(ValidationError::OutOfRange {
                field: "grace_period_millis",
                reason: "must not be negative",
            });
        }
        if self.snapshot_timeout_secs == 0 {
            return Err(ValidationError::OutOfRange {
                field: "snapshot_timeout_secs",
                reason: "must be greater than zero",
            });
        }
        if self.workers == 0 || self.workers > 256 {
            return Err(ValidationError::OutOfRange {
                field: "workers",
                reason: "must be between 1 and 256",
            });
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::OutOfRange {
                field: "queue_capacity",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            grace_period_millis: default_grace_period(),
            snapshot_timeout_secs: default_snapshot_timeout(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

fn default_grace_period() -> i64 {
    DEFAULT_GRACE_PERIOD_MILLIS
}

fn default_snapshot_timeout() -> u64 {
    10
}

fn default_workers() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}
