//! Email delivery over SMTP via lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{env_parse, env_var};
use crate::error::{ChannelError, ConfigError};
use crate::model::Channel;

/// Delivery collaborator: hands a rendered message to a transport.
///
/// Implementations do not retry; a failure is reported once.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        channel: Channel,
    ) -> Result<(), ChannelError>;
}

// ── Configuration ───────────────────────────────────────────────────

/// SMTP configuration, built from environment variables.
///
/// Without a username the transport talks plain SMTP, which is what
/// local catchers such as Mailhog expect.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from_address: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1025,
            username: None,
            password: None,
            from_address: "no-reply@notify.local".into(),
        }
    }
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env_var("SMTP_HOST").unwrap_or(defaults.host),
            port: env_parse("SMTP_PORT", defaults.port)?,
            username: env_var("SMTP_USERNAME"),
            password: env_var("SMTP_PASSWORD").map(SecretString::from),
            from_address: env_var("SMTP_FROM").unwrap_or(defaults.from_address),
        })
    }
}

// ── Sender ──────────────────────────────────────────────────────────

/// `EmailSender` backed by a lettre SMTP transport.
pub struct SmtpSender {
    config: SmtpConfig,
    from: Mailbox,
}

impl SmtpSender {
    /// Validate the from address up front so a bad config fails at startup.
    pub fn new(config: SmtpConfig) -> Result<Self, ConfigError> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_FROM".into(),
                message: format!("'{}': {e}", config.from_address),
            })?;
        Ok(Self { config, from })
    }

    fn transport(&self) -> Result<SmtpTransport, ChannelError> {
        let Some(username) = &self.config.username else {
            return Ok(SmtpTransport::builder_dangerous(&self.config.host)
                .port(self.config.port)
                .build());
        };

        let password = self
            .config
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();
        let builder = if self.config.port == 465 {
            SmtpTransport::relay(&self.config.host)
        } else {
            SmtpTransport::starttls_relay(&self.config.host)
        }
        .map_err(|e| send_failed(format!("SMTP relay error: {e}")))?;

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(username.clone(), password))
            .build())
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, ChannelError> {
        let to: Mailbox = to.parse().map_err(|e| ChannelError::InvalidAddress {
            address: to.to_string(),
            reason: format!("{e}"),
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| send_failed(format!("Failed to build email: {e}")))
    }
}

fn send_failed(reason: String) -> ChannelError {
    ChannelError::SendFailed {
        name: "email".into(),
        reason,
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        channel: Channel,
    ) -> Result<(), ChannelError> {
        let email = self.build_message(to, subject, body)?;
        let transport = self.transport()?;

        // lettre's SmtpTransport is blocking.
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| send_failed(format!("SMTP task panicked: {e}")))?
            .map_err(|e| send_failed(format!("SMTP send failed: {e}")))?;

        tracing::info!(to = to, channel = %channel, "Email sent");
        Ok(())
    }
}
