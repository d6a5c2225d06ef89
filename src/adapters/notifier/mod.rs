//! Notifier adapters.

mod logging;
mod resend;

pub use logging::LoggingNotifier;
pub use resend::{ResendNotifier, DEFAULT_RESEND_BASE_URL};
