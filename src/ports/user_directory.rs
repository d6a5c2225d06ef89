//! UserDirectory port - account storage keyed by email.
//!
//! Production and test implementations are interchangeable; the
//! reconciliation engine only relies on the contract below.

use async_trait::async_trait;

use crate::domain::billing::{AccountRecord, NewAccount};
use crate::domain::foundation::{DomainError, EmailAddress};

/// Lookup, create and update operations on account records.
///
/// # Contract
///
/// - `email` is unique: `create` for an email that already has a record fails
///   with `ErrorCode::AccountAlreadyExists` and leaves the existing record as is
/// - `create` supplies the provisioning secret
/// - `update` replaces the record stored under `record.email`; updating an
///   unknown email fails with `ErrorCode::AccountNotFound`
/// - Transient storage failures use `ErrorCode::DatabaseError`
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, email: &EmailAddress) -> Result<Option<AccountRecord>, DomainError>;

    async fn create(&self, account: NewAccount) -> Result<AccountRecord, DomainError>;

    async fn update(&self, record: &AccountRecord) -> Result<(), DomainError>;
}
