//! Webhook notification channel.

#[cfg(feature = "webhook")]
use async_trait::async_trait;
#[cfg(feature = "webhook")]
use std::collections::HashMap;

#[cfg(feature = "webhook")]
use super::NotificationChannel;
#[cfg(feature = "webhook")]
use crate::error::{Error, Result};
#[cfg(feature = "webhook")]
use crate::notification::Notification;

/// Channel that POSTs notifications as JSON to a webhook URL.
#[cfg(feature = "webhook")]
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    name: String,
    enabled: bool,
    url: String,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

#[cfg(feature = "webhook")]
impl WebhookChannel {
    pub fn new(name: String, url: String) -> Self {
        Self {
            name,
            enabled: true,
            url,
            headers: HashMap::new(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(feature = "webhook")]
#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        let payload = serde_json::json!({
            "to": to,
            "kind": notification.kind,
            "ticket_id": notification.ticket_id,
            "ticket_code": notification.ticket_code,
            "subject": notification.subject,
            "body": notification.body,
            "severity": notification.severity,
            "created_at": notification.created_at,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::SendFailed(format!("Webhook request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::SendFailed(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
