//! In-memory user directory.
//!
//! Backs the service when no database is configured, and every test that
//! needs a real directory contract.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::billing::{generate_temporary_password, AccountRecord, NewAccount, ProvisioningSecret};
use crate::domain::foundation::{DomainError, EmailAddress, ErrorCode};
use crate::ports::UserDirectory;

/// Account records keyed by normalized email.
///
/// # Example
///
/// ```ignore
/// let directory = InMemoryUserDirectory::new();
/// let record = directory.create(new_account).await?;
/// assert_eq!(directory.len(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryUserDirectory {
    accounts: RwLock<HashMap<EmailAddress, AccountRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a record (for tests and fixtures).
    pub fn insert(&self, record: AccountRecord) {
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(record.email.clone(), record);
        }
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored records, in no particular order.
    pub fn records(&self) -> Vec<AccountRecord> {
        self.accounts
            .read()
            .map(|a| a.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Directory lock poisoned")
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, email: &EmailAddress) -> Result<Option<AccountRecord>, DomainError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(email).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<AccountRecord, DomainError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.contains_key(&account.email) {
            return Err(DomainError::new(
                ErrorCode::AccountAlreadyExists,
                format!("Account already exists for {}", account.email),
            ));
        }

        let record = account.into_record(ProvisioningSecret::new(generate_temporary_password()));
        accounts.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: &AccountRecord) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        match accounts.get_mut(&record.email) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::AccountNotFound,
                format!("No account for {}", record.email),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ada Lovelace".to_string(),
            email: EmailAddress::parse(email).unwrap(),
            subscription_status: SubscriptionStatus::Active,
            expire_at_millis: 1_000,
        }
    }

    #[tokio::test]
    async fn create_then_lookup_returns_record_with_secret() {
        let directory = InMemoryUserDirectory::new();

        let created = directory.create(new_account("ada@example.com")).await.unwrap();
        let found = directory
            .lookup(&EmailAddress::parse("ADA@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found, created);
        assert_eq!(found.provisioning_secret.expose().split('-').count(), 3);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected_and_keeps_original() {
        let directory = InMemoryUserDirectory::new();
        let original = directory.create(new_account("ada@example.com")).await.unwrap();

        let mut second = new_account("ada@example.com");
        second.expire_at_millis = 9_999;
        let err = directory.create(second).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AccountAlreadyExists);
        assert_eq!(directory.records(), vec![original]);
    }

    #[tokio::test]
    async fn update_replaces_existing_record() {
        let directory = InMemoryUserDirectory::new();
        let mut record = directory.create(new_account("ada@example.com")).await.unwrap();

        record.apply_status(SubscriptionStatus::Canceled);
        directory.update(&record).await.unwrap();

        let found = directory.lookup(&record.email).await.unwrap().unwrap();
        assert_eq!(found.subscription_status, SubscriptionStatus::Canceled);
    }

    #[tokio::test]
    async fn update_of_unknown_email_is_not_found() {
        let directory = InMemoryUserDirectory::new();
        let record = new_account("ghost@example.com").into_record(ProvisioningSecret::new("x"));

        let err = directory.update(&record).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AccountNotFound);
        assert!(directory.is_empty());
    }
}
