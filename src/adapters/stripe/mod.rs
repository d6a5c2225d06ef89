//! Stripe adapter.
//!
//! Implements the `SubscriptionSource` port against the Stripe REST API,
//! plus a configurable mock for tests.
//!
//! # Security
//!
//! - The API key is held in `secrecy::SecretString` and only exposed for the
//!   basic-auth header

mod api_types;
mod mock_subscription_source;
mod stripe_adapter;

pub use api_types::{StripeErrorResponse, StripeSubscription};
pub use mock_subscription_source::MockSubscriptionSource;
pub use stripe_adapter::{StripeConfig, StripeSubscriptionSource, DEFAULT_API_BASE_URL};
