//! Billing Reconciler - payment processor webhook gate and subscription
//! reconciliation.
//!
//! Verified webhook events are acknowledged immediately and reconciled in the
//! background against the processor's live subscription state, creating or
//! updating accounts in the user directory.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
