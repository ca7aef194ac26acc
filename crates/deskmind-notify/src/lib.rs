//! Notification dispatch for DeskMind.
//!
//! Resolves recipients per notification kind and emits messages through
//! pluggable outbound channels (console, memory, SMTP email, webhook).

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod notification;

pub use channels::{ChannelRegistry, ConsoleChannel, Delivery, MemoryChannel, NotificationChannel};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::{Error, Result};
pub use notification::{Notification, Severity};

#[cfg(feature = "email")]
pub use channels::EmailChannel;

#[cfg(feature = "webhook")]
pub use channels::WebhookChannel;
