//! Console notification channel.

use async_trait::async_trait;

use super::NotificationChannel;
use crate::error::{Error, Result};
use crate::notification::{Notification, Severity};

/// Channel that writes notifications to the log output.
#[derive(Debug, Clone)]
pub struct ConsoleChannel {
    name: String,
    enabled: bool,
}

impl ConsoleChannel {
    pub fn new(name: String) -> Self {
        Self {
            name,
            enabled: true,
        }
    }

    pub fn disabled(name: String) -> Self {
        Self {
            name,
            enabled: false,
        }
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "console"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        match notification.severity {
            Severity::Critical => tracing::warn!(
                to = %to,
                ticket = %notification.ticket_code,
                kind = %notification.kind,
                subject = %notification.subject,
                "{}",
                notification.body
            ),
            _ => tracing::info!(
                to = %to,
                ticket = %notification.ticket_code,
                kind = %notification.kind,
                subject = %notification.subject,
                "{}",
                notification.body
            ),
        }
        Ok(())
    }
}
