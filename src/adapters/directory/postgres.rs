//! PostgreSQL implementation of UserDirectory.
//!
//! Accounts live in the `accounts` table keyed by normalized email.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::domain::billing::{
    generate_temporary_password, AccountRecord, NewAccount, ProvisioningSecret, SubscriptionStatus,
};
use crate::domain::foundation::{DomainError, EmailAddress, ErrorCode};
use crate::ports::UserDirectory;

/// Schema migrations for the `accounts` table, embedded at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// PostgreSQL implementation of the UserDirectory port.
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a new PostgresUserDirectory with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    email: String,
    name: String,
    provisioning_secret: String,
    subscription_status: String,
    expire_at_millis: i64,
    #[allow(dead_code)]
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::parse(&row.email).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored email: {}", e))
        })?;

        Ok(AccountRecord {
            name: row.name,
            email,
            provisioning_secret: ProvisioningSecret::new(row.provisioning_secret),
            subscription_status: parse_status(&row.subscription_status)?,
            expire_at_millis: row.expire_at_millis,
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    s.parse::<SubscriptionStatus>().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn lookup(&self, email: &EmailAddress) -> Result<Option<AccountRecord>, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT email, name, provisioning_secret, subscription_status, expire_at_millis, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find account", e))?;

        row.map(AccountRecord::try_from).transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<AccountRecord, DomainError> {
        let record = account.into_record(ProvisioningSecret::new(generate_temporary_password()));

        let inserted: Option<AccountRow> = sqlx::query_as(
            r#"
            INSERT INTO accounts (
                email, name, provisioning_secret, subscription_status, expire_at_millis,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING email, name, provisioning_secret, subscription_status, expire_at_millis, updated_at
            "#,
        )
        .bind(record.email.as_str())
        .bind(&record.name)
        .bind(record.provisioning_secret.expose())
        .bind(record.subscription_status.as_str())
        .bind(record.expire_at_millis)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("create account", e))?;

        match inserted {
            Some(row) => AccountRecord::try_from(row),
            None => Err(DomainError::new(
                ErrorCode::AccountAlreadyExists,
                format!("Account already exists for {}", record.email),
            )),
        }
    }

    async fn update(&self, record: &AccountRecord) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                name = $2,
                subscription_status = $3,
                expire_at_millis = $4,
                updated_at = NOW()
            WHERE email = $1
            "#,
        )
        .bind(record.email.as_str())
        .bind(&record.name)
        .bind(record.subscription_status.as_str())
        .bind(record.expire_at_millis)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update account", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AccountNotFound,
                format!("No account for {}", record.email),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_migration_is_embedded() {
        assert!(MIGRATOR
            .iter()
            .any(|migration| migration.version == 1 && migration.description == "create accounts"));
    }

    fn row(status: &str) -> AccountRow {
        AccountRow {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            provisioning_secret: "apple-potato-mirror".to_string(),
            subscription_status: status.to_string(),
            expire_at_millis: 42,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = AccountRecord::try_from(row("past_due")).unwrap();

        assert_eq!(record.email.as_str(), "ada@example.com");
        assert_eq!(record.subscription_status, SubscriptionStatus::PastDue);
        assert_eq!(record.provisioning_secret.expose(), "apple-potato-mirror");
        assert_eq!(record.expire_at_millis, 42);
    }

    #[test]
    fn unknown_stored_status_is_database_error() {
        let err = AccountRecord::try_from(row("paused")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn every_status_round_trips_through_its_column_value() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }
}
