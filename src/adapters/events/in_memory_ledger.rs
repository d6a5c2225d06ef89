//! In-memory webhook event ledger.
//!
//! Holds processed-event records for the lifetime of the process. Dead
//! letters are visible through `list_failed` until they are replaced by a
//! successful redelivery or pruned by `delete_before`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Ledger of processed webhook events keyed by event id.
#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        match records.get(&record.event_id) {
            Some(existing) if existing.outcome.is_final() => Ok(SaveResult::AlreadyExists),
            Some(_) => {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Replaced)
            }
            None => {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Inserted)
            }
        }
    }

    async fn list_failed(&self, limit: usize) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let records = self.records.read().await;
        let mut failed: Vec<WebhookEventRecord> = records
            .values()
            .filter(|r| !r.outcome.is_final())
            .cloned()
            .collect();
        failed.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        failed.truncate(limit);
        Ok(failed)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.processed_at >= timestamp);
        Ok((before - records.len()) as u64)
    }
}
