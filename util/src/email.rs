//! Outgoing mail abstraction.
//!
//! Services talk to a [`Mailer`] rather than to SMTP directly. The production
//! implementation is [`LettreMailer`] wrapping lettre's async SMTP transport;
//! any other `lettre::AsyncTransport` (such as the stub transport) fits the
//! same wrapper.
//!
//! # Environment Variables
//! - `MAIL_SERVER`, `MAIL_PORT`, `MAIL_USE_TLS`, `MAIL_TIMEOUT_SECS`
//! - `MAIL_USERNAME`, `MAIL_PASSWORD`
//! - `MAIL_DEFAULT_SENDER`: sender mailbox, defaults to `MAIL_USERNAME`

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, SinglePart, header},
    transport::smtp::authentication::Credentials,
};
use std::fmt::Display;
use std::time::Duration;

use crate::config;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl OutgoingEmail {
    pub fn plain(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("could not build message: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("mail delivery is not configured")]
    NotConfigured,
}

/// Anything that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// [`Mailer`] backed by a lettre async transport.
pub struct LettreMailer<T> {
    transport: T,
    from: Mailbox,
}

impl<T> LettreMailer<T> {
    pub fn new(transport: T, from: &str) -> Result<Self, EmailError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|_| EmailError::Address(from.to_string()))?;
        Ok(Self { transport, from })
    }

    fn build(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|_| EmailError::Address(email.to.clone()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_PLAIN)
                    .body(email.text.clone()),
            )
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl<T> Mailer for LettreMailer<T>
where
    T: AsyncTransport + Send + Sync,
    T::Ok: Send,
    T::Error: Display + Send,
{
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = self.build(email)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| EmailError::Transport(e.to_string()))
    }
}

/// Builds the SMTP mailer from the `MAIL_*` configuration.
pub fn smtp_mailer_from_config()
-> Result<LettreMailer<AsyncSmtpTransport<Tokio1Executor>>, EmailError> {
    let server = config::mail_server();
    let sender = config::mail_default_sender();
    if server.is_empty() || sender.is_empty() {
        return Err(EmailError::NotConfigured);
    }

    let mut builder = if config::mail_use_tls() {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server)
            .map_err(|e| EmailError::Transport(e.to_string()))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server)
    };

    builder = builder
        .port(config::mail_port())
        .timeout(Some(Duration::from_secs(config::mail_timeout_secs())));

    let username = config::mail_username();
    if !username.is_empty() {
        builder = builder.credentials(Credentials::new(username, config::mail_password()));
    }

    LettreMailer::new(builder.build(), &sender)
}

/// Mailer used when SMTP settings are absent; every send fails.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}
