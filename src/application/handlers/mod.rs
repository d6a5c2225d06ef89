//! Application handlers.
//!
//! Handlers that orchestrate domain operations across ports.

pub mod billing;
