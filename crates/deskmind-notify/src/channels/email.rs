//! Email notification channel.

#[cfg(feature = "email")]
use async_trait::async_trait;

#[cfg(feature = "email")]
use super::NotificationChannel;
#[cfg(feature = "email")]
use crate::error::{Error, Result};
#[cfg(feature = "email")]
use crate::notification::Notification;

/// Email channel for sending notifications via SMTP.
#[cfg(feature = "email")]
#[derive(Debug, Clone)]
pub struct EmailChannel {
    name: String,
    enabled: bool,
    smtp_server: String,
    smtp_port: u16,
    username: String,
    password: String,
    from_address: String,
}

#[cfg(feature = "email")]
impl EmailChannel {
    pub fn new(
        name: String,
        smtp_server: String,
        smtp_port: u16,
        username: String,
        password: String,
        from_address: String,
    ) -> Self {
        Self {
            name,
            enabled: true,
            smtp_server,
            smtp_port,
            username,
            password,
            from_address,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn build_html_body(&self, notification: &Notification) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; }}
        .notification {{ padding: 20px; border-radius: 5px; }}
        .severity-info {{ background-color: #d4edda; border-left: 4px solid #28a745; }}
        .severity-warning {{ background-color: #fff3cd; border-left: 4px solid #ffc107; }}
        .severity-critical {{ background-color: #f8d7da; border-left: 4px solid #dc3545; }}
        .timestamp {{ color: #6c757d; font-size: 0.9em; }}
        .ticket {{ font-weight: bold; }}
    </style>
</head>
<body>
    <div class="notification severity-{}">
        <h2>{}</h2>
        <p class="timestamp">{}</p>
        <p><strong>Ticket:</strong> <span class="ticket">{}</span></p>
        <p>{}</p>
    </div>
</body>
</html>"#,
            notification.severity.as_str(),
            notification.subject,
            notification.created_at.format("%Y-%m-%d %H:%M:%S"),
            notification.ticket_code,
            notification.body
        )
    }
}

#[cfg(feature = "email")]
#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        let html_body = self.build_html_body(notification);
        let subject = format!(
            "[{}] {}",
            notification.ticket_code, notification.subject
        );

        let from_mailbox: lettre::message::Mailbox = self
            .from_address
            .parse()
            .map_err(|e| Error::InvalidConfiguration(format!("Invalid from address: {e}")))?;
        let to_mailbox: lettre::message::Mailbox = to
            .parse()
            .map_err(|e| Error::InvalidConfiguration(format!("Invalid to address: {e}")))?;

        let email = lettre::Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_PLAIN)
                            .body(format!(
                                "{}\n\n{}",
                                notification.subject, notification.body
                            )),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| Error::SendFailed(format!("Failed to build email: {e}")))?;

        let smtp_server = self.smtp_server.clone();
        let smtp_port = self.smtp_port;
        let username = self.username.clone();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || {
            let creds =
                lettre::transport::smtp::authentication::Credentials::new(username, password);
            let relay = format!("{smtp_server}:{smtp_port}");
            let mailer = lettre::SmtpTransport::relay(&relay)
                .map_err(|e| Error::SendFailed(format!("Invalid SMTP server: {e}")))?
                .credentials(creds)
                .build();

            lettre::Transport::send(&mailer, &email)
                .map_err(|e| Error::SendFailed(format!("Failed to send email: {e}")))?;

            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::SendFailed(format!("Task join error: {e}")))?
    }
}
