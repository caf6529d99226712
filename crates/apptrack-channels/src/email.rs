//! Email channel — SMTP delivery of reminder notifications.
//!
//! Sends multipart (plain text + HTML) messages via async lettre. Supports
//! STARTTLS relays (Gmail, Outlook on 587), implicit TLS (465) and plain
//! connections for local test servers.

use apptrack_core::config::MailConfig;
use apptrack_core::error::{AppTrackError, Result};
use apptrack_core::traits::NotificationSender;
use apptrack_core::types::RenderedMessage;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS from the first byte.
    Tls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
    /// No encryption (local relays only).
    None,
}

impl SmtpSecurity {
    pub fn from_config(config: &MailConfig) -> Self {
        if config.use_ssl {
            Self::Tls
        } else if config.use_tls {
            Self::StartTls
        } else {
            Self::None
        }
    }
}

/// SMTP sender.
pub struct EmailSender {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSender {
    /// Build a sender from mail settings. The transport connects lazily on first send.
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from = build_from_mailbox(config)?;

        let builder = match SmtpSecurity::from_config(config) {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| AppTrackError::Config(format!("SMTP relay: {e}")))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| AppTrackError::Config(format!("SMTP relay: {e}")))?
            }
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(20)));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        tracing::debug!(
            "📧 SMTP sender configured: {}:{} ({:?})",
            config.host,
            config.port,
            SmtpSecurity::from_config(config)
        );

        Ok(Self {
            from,
            mailer: builder.build(),
        })
    }
}

fn build_from_mailbox(config: &MailConfig) -> Result<Mailbox> {
    if config.username.trim().is_empty() {
        return Err(AppTrackError::Config(
            "mail.username (EMAIL_HOST_USER) is required to send email".into(),
        ));
    }
    let raw = if config.from_name.trim().is_empty() {
        config.username.clone()
    } else {
        format!("{} <{}>", config.from_name, config.username)
    };
    raw.parse()
        .map_err(|e| AppTrackError::Config(format!("Invalid from address: {e}")))
}

/// Assemble the multipart message for one recipient.
pub fn build_message(from: &Mailbox, to: &str, message: &RenderedMessage) -> Result<Message> {
    let to_mailbox: Mailbox = to
        .parse()
        .map_err(|e| AppTrackError::Delivery(format!("Invalid to: {e}")))?;

    Message::builder()
        .from(from.clone())
        .to(to_mailbox)
        .subject(message.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            message.html.clone(),
        ))
        .map_err(|e| AppTrackError::Delivery(format!("Build email: {e}")))
}

#[async_trait]
impl NotificationSender for EmailSender {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, to: &str, message: &RenderedMessage) -> Result<()> {
        let email = build_message(&self.from, to, message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| AppTrackError::Delivery(format!("SMTP send: {e}")))?;
        tracing::info!("📤 Email sent to: {to}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> RenderedMessage {
        RenderedMessage {
            subject: "⏰ Reminder: ACME deadline in 3 days".into(),
            text: "Title: ACME".into(),
            html: "<p>ACME</p>".into(),
        }
    }

    #[test]
    fn test_security_from_config() {
        let mut config = MailConfig::default();
        assert_eq!(SmtpSecurity::from_config(&config), SmtpSecurity::StartTls);
        config.use_ssl = true;
        assert_eq!(SmtpSecurity::from_config(&config), SmtpSecurity::Tls);
        config.use_ssl = false;
        config.use_tls = false;
        assert_eq!(SmtpSecurity::from_config(&config), SmtpSecurity::None);
    }

    #[test]
    fn test_missing_username_is_config_error() {
        let config = MailConfig::default();
        assert!(matches!(EmailSender::new(&config), Err(AppTrackError::Config(_))));
    }

    #[test]
    fn test_build_message_is_multipart() {
        let config = MailConfig {
            username: "tracker@example.com".into(),
            ..MailConfig::default()
        };
        let from = build_from_mailbox(&config).unwrap();
        let msg = build_message(&from, "admin@example.com", &rendered()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("admin@example.com"));
        assert!(raw.contains("Application Tracker"));
    }

    #[test]
    fn test_invalid_recipient_is_delivery_error() {
        let config = MailConfig {
            username: "tracker@example.com".into(),
            ..MailConfig::default()
        };
        let from = build_from_mailbox(&config).unwrap();
        let err = build_message(&from, "not an address", &rendered()).unwrap_err();
        assert!(matches!(err, AppTrackError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_sender_builds_for_plain_relay() {
        let config = MailConfig {
            host: "localhost".into(),
            port: 2525,
            username: "tracker@example.com".into(),
            use_tls: false,
            ..MailConfig::default()
        };
        let sender = EmailSender::new(&config).unwrap();
        assert_eq!(sender.name(), "smtp");
    }
}
