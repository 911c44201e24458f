//! Best-effort event notifications for TradeSmart.
//!
//! Posts Discord-style `{username, embeds}` cards for analyzed alerts and
//! position lifecycle events. Failures are logged and swallowed; nothing
//! here may take down the caller. With no webhook configured, every send
//! reports [`NotifyOutcome::Skipped`].

pub mod notifier;
pub mod payload;

pub use notifier::{Notifier, NotifierConfig, NotifyOutcome, NotifySend};
