//! Outbound email.
//!
//! The identity flows only need "deliver this text to that address"; the
//! transport behind it is chosen at startup from the SMTP configuration.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox.
    InvalidAddress(String),
    /// The message could not be assembled.
    Build(String),
    /// The transport refused or failed to deliver.
    Transport(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MailError::InvalidAddress(addr) => write!(f, "invalid email address: {}", addr),
            MailError::Build(msg) => write!(f, "failed to build message: {}", msg),
            MailError::Transport(msg) => write!(f, "mail delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for MailError {}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Delivers through an SMTP relay using STARTTLS and credentials.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        log::debug!("sent '{}' to {}", subject, to);
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        log::info!("mail to {} | {} | {}", to, subject, body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every message it is asked to send. A failing outbox records nothing
/// and reports a transport error instead.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.messages().clone()
    }

    /// The most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<SentMail> {
        self.messages().iter().rev().find(|m| m.to == to).cloned()
    }

    fn messages(&self) -> MutexGuard<'_, Vec<SentMail>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("outbox is set to fail".into()));
        }
        self.messages().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_outbox_records_messages() {
        let outbox = Outbox::new();
        outbox.send("ann@x.com", "Hello", "first").await.unwrap();
        outbox.send("bob@x.com", "Hello", "other").await.unwrap();
        outbox.send("ann@x.com", "Again", "second").await.unwrap();

        assert_eq!(outbox.sent().len(), 3);
        assert_eq!(outbox.last_to("ann@x.com").unwrap().body, "second");
        assert!(outbox.last_to("cy@x.com").is_none());
    }

    #[actix_rt::test]
    async fn test_failing_outbox() {
        let outbox = Outbox::failing();
        let err = outbox.send("ann@x.com", "Hello", "body").await.unwrap_err();

        assert!(matches!(err, MailError::Transport(_)));
        assert!(outbox.sent().is_empty());
    }

    #[actix_rt::test]
    async fn test_log_mailer_always_succeeds() {
        assert!(LogMailer.send("ann@x.com", "Hello", "body").await.is_ok());
    }
}
