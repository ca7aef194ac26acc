//! Error types for the notification system.

use thiserror::Error;

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur dispatching notifications.
#[derive(Debug, Error)]
pub enum Error {
    /// Channel or recipient not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Channel is disabled.
    #[error("Channel disabled: {0}")]
    ChannelDisabled(String),

    /// Send operation failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Directory lookup failed.
    #[error("Directory failure: {0}")]
    Store(#[from] deskmind_core::StoreError),

    /// Other error.
    #[error("Other: {0}")]
    Other(#[from] anyhow::Error),
}
