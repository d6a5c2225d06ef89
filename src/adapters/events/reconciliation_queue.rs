//! Keyed reconciliation queue.
//!
//! Acknowledged events are fanned out to a fixed pool of worker shards. Each
//! event goes to the shard selected by a stable hash of its routing key, and
//! each shard processes its events one at a time. Two events for the same
//! account are therefore never reconciled concurrently, while unrelated
//! accounts proceed on other shards.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `workers` | 8 | Number of shards |
//! | `capacity` | 256 | Buffered events per shard |
//!
//! ## Shutdown
//!
//! Buffering is bounded by `workers * capacity`: `try_enqueue` never waits,
//! it hands a full shard's event back to the caller.
//!
//! Dropping every handle to the queue closes the shard channels. Workers
//! drain what is already buffered and exit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

use crate::domain::billing::{ReconcileError, WebhookEvent, WebhookProcessor};

/// Configuration for the reconciliation queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Number of worker shards.
    pub workers: usize,

    /// Bounded channel capacity per shard.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            capacity: 256,
        }
    }
}

impl QueueConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Sending side of the worker shards.
#[derive(Clone)]
pub struct ReconciliationQueue {
    shards: Arc<Vec<mpsc::Sender<WebhookEvent>>>,
}

impl ReconciliationQueue {
    /// Spawn the worker shards.
    ///
    /// Returns the queue and the worker handles; the handles complete once the
    /// queue is dropped and the shards are drained.
    pub fn start(
        processor: Arc<WebhookProcessor>,
        config: QueueConfig,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let workers = config.workers.max(1);
        let capacity = config.capacity.max(1);

        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for shard in 0..workers {
            let (tx, rx) = mpsc::channel(capacity);
            shards.push(tx);
            let span = tracing::info_span!("reconcile_worker", shard);
            handles.push(tokio::spawn(
                run_worker(rx, processor.clone()).instrument(span),
            ));
        }

        info!(workers, capacity, "Reconciliation queue started");

        (
            Self {
                shards: Arc::new(shards),
            },
            handles,
        )
    }

    /// Number of worker shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard that serializes the given routing key.
    pub fn shard_for(&self, routing_key: &str) -> usize {
        shard_index(routing_key, self.shards.len())
    }

    /// Queue an event behind any earlier events with the same routing key.
    ///
    /// Returns the shard index. Never waits: a full or closed shard hands the
    /// event back inside `Rejected`.
    pub fn try_enqueue(&self, event: WebhookEvent) -> Result<usize, Rejected> {
        let shard = self.shard_for(&event.routing_key());
        let event_id = event.id.clone();
        match self.shards[shard].try_send(event) {
            Ok(()) => {
                debug!(event_id = %event_id, shard, "Event queued");
                Ok(shard)
            }
            Err(TrySendError::Full(event)) => Err(Rejected {
                event,
                error: ReconcileError::QueueFull { shard },
            }),
            Err(TrySendError::Closed(event)) => Err(Rejected {
                event,
                error: ReconcileError::QueueClosed,
            }),
        }
    }
}

/// An event the queue could not take, with the reason.
#[derive(Debug)]
pub struct Rejected {
    pub event: WebhookEvent,
    pub error: ReconcileError,
}

fn shard_index(routing_key: &str, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    routing_key.hash(&mut hasher);
    (hasher.finish() % shard_count.max(1) as u64) as usize
}

async fn run_worker(mut rx: mpsc::Receiver<WebhookEvent>, processor: Arc<WebhookProcessor>) {
    while let Some(event) = rx.recv().await {
        // Outcomes, including dead letters, are logged and recorded by the processor.
        let _ = processor.process(&event).await;
    }
    debug!("Reconciliation worker stopped");
}
