//! User directory adapters.
//!
//! - `InMemoryUserDirectory` - default when no database is configured
//! - `PostgresUserDirectory` - sqlx-backed `accounts` table

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserDirectory;
pub use postgres::{PostgresUserDirectory, MIGRATOR};
