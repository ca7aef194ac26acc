//! Outbound notification channels.

pub mod console;
pub mod memory;

#[cfg(feature = "webhook")]
pub mod webhook;

#[cfg(feature = "email")]
pub mod email;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::notification::Notification;

pub use console::ConsoleChannel;
pub use memory::{Delivery, MemoryChannel};

#[cfg(feature = "webhook")]
pub use webhook::WebhookChannel;

#[cfg(feature = "email")]
pub use email::EmailChannel;

/// Trait for outbound channels.
///
/// `to` is the recipient's channel-level address (an email address for the
/// mail channel, an opaque recipient hint for webhooks). Sends are
/// fire-and-forget from the dispatcher's point of view.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &str;

    /// Get the channel type.
    fn channel_type(&self) -> &str;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Send a notification to one recipient address.
    async fn send(&self, to: &str, notification: &Notification) -> Result<()>;
}

/// Registry of outbound channels.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<dyn NotificationChannel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a channel instance under its own name.
    pub async fn register(&self, channel: Arc<dyn NotificationChannel>) {
        let name = channel.name().to_string();
        self.channels.write().await.insert(name, channel);
    }

    /// Unregister a channel by name.
    pub async fn unregister(&self, name: &str) -> bool {
        self.channels.write().await.remove(name).is_some()
    }

    /// Get a channel by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.read().await.get(name).cloned()
    }

    /// All enabled channels.
    pub async fn enabled(&self) -> Vec<Arc<dyn NotificationChannel>> {
        self.channels
            .read()
            .await
            .values()
            .filter(|c| c.is_enabled())
            .cloned()
            .collect()
    }

    /// List all channel names.
    pub async fn list_names(&self) -> Vec<String> {
        self.channels.read().await.keys().cloned().collect()
    }

    /// Get the number of channels.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Check if empty.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Send a test notification through a channel.
    pub async fn test(&self, name: &str, to: &str) -> Result<()> {
        let channel = self
            .get(name)
            .await
            .ok_or_else(|| Error::NotFound(format!("Channel not found: {name}")))?;

        let probe = Notification::new(
            deskmind_core::NotificationKind::TicketCreated,
            deskmind_core::TicketId::new(),
            "TEST",
            "Test notification",
            "This is a test notification to verify the channel is working.",
        );
        channel.send(to, &probe).await
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
