//! Shared domain primitives: error types and value objects.

mod email;
mod errors;

pub use email::EmailAddress;
pub use errors::{DomainError, ErrorCode, ValidationError};
