//! Memory notification channel (for testing).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::NotificationChannel;
use crate::error::{Error, Result};
use crate::notification::Notification;

/// One recorded delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Recipient address the send targeted
    pub to: String,
    /// The notification that was sent
    pub notification: Notification,
}

/// In-memory channel that records deliveries instead of sending them.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    name: String,
    enabled: bool,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    /// When set, every send fails with this message.
    fail_with: Option<String>,
}

impl MemoryChannel {
    pub fn new(name: String) -> Self {
        Self {
            name,
            enabled: true,
            deliveries: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn disabled(name: String) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }

    /// A channel whose sends always fail, for failure-path tests.
    pub fn failing(name: String, message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new(name)
        }
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.deliveries.lock().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.deliveries.lock().await.len()
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "memory"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }
        if let Some(message) = &self.fail_with {
            return Err(Error::SendFailed(message.clone()));
        }
        self.deliveries.lock().await.push(Delivery {
            to: to.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskmind_core::{NotificationKind, TicketId};

    fn notification() -> Notification {
        Notification::new(
            NotificationKind::TicketAssigned,
            TicketId::new(),
            "TCK-2",
            "Assigned",
            "Ticket assigned to you.",
        )
    }

    #[tokio::test]
    async fn test_memory_records_deliveries() {
        let channel = MemoryChannel::new("mem".to_string());

        channel.send("a@example.com", &notification()).await.unwrap();
        channel.send("b@example.com", &notification()).await.unwrap();

        assert_eq!(channel.count().await, 2);
        let deliveries = channel.deliveries().await;
        assert_eq!(deliveries[0].to, "a@example.com");
        assert_eq!(deliveries[1].to, "b@example.com");

        channel.clear().await;
        assert_eq!(channel.count().await, 0);
    }

    #[tokio::test]
    async fn test_memory_disabled() {
        let channel = MemoryChannel::disabled("mem".to_string());
        assert!(channel.send("a@example.com", &notification()).await.is_err());
        assert_eq!(channel.count().await, 0);
    }

    #[tokio::test]
    async fn test_memory_failing() {
        let channel = MemoryChannel::failing("mem".to_string(), "smtp 421");
        let err = channel
            .send("a@example.com", &notification())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("smtp 421"));
        assert_eq!(channel.count().await, 0);
    }
}
