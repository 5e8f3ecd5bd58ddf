//! Mail transport abstraction and the SMTP implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::SmtpConfig;

use super::memory::MemoryTransport;
use super::types::{ResolvedMessage, TransportError};

/// Delivers a fully resolved message.
///
/// Returns the message identifier assigned to the accepted message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &ResolvedMessage) -> Result<String, TransportError>;

    /// Check that the transport can reach its server
    async fn verify(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// SMTP transport backed by `lettre`.
///
/// `secure` selects implicit TLS; otherwise STARTTLS is used when the
/// server offers it. Credentials are attached only when both user and
/// password are configured.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Smtp(e.to_string()))?
        } else {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| TransportError::Smtp(e.to_string()))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &ResolvedMessage) -> Result<String, TransportError> {
        let (message_id, email) = build_message(message)?;

        self.inner
            .send(email)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), TransportError> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Smtp(
                "server did not accept the connection".to_string(),
            )),
            Err(e) => Err(TransportError::Smtp(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

fn parse_mailbox(field: &'static str, address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            field,
            address: address.to_string(),
            detail: e.to_string(),
        })
}

/// Build the MIME message and the `Message-ID` it carries
pub(crate) fn build_message(
    message: &ResolvedMessage,
) -> Result<(String, Message), TransportError> {
    let from = parse_mailbox("from", &message.from)?;
    let to = parse_mailbox("to", &message.to)?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let mut builder = Message::builder()
        .message_id(Some(message_id.clone()))
        .from(from)
        .to(to)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML);

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(parse_mailbox("reply-to", reply_to)?);
    }

    let email = builder
        .body(message.rendered_body.clone())
        .map_err(|e| TransportError::Build(e.to_string()))?;

    Ok((message_id, email))
}

/// Create a mail transport based on configuration.
///
/// - `"memory"`: records messages in process without sending them
/// - `"smtp"` (default): delivers through the configured SMTP server
pub fn create_transport(config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
    match config.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-memory mail transport");
            Ok(Arc::new(MemoryTransport::new()))
        }
        other => {
            if other != "smtp" {
                tracing::warn!(backend = %other, "Unknown mail transport, falling back to smtp");
            }
            tracing::info!(
                backend = "smtp",
                host = %config.host,
                port = config.port,
                secure = config.secure,
                "Creating SMTP mail transport"
            );
            Ok(Arc::new(SmtpMailTransport::new(config)?))
        }
    }
}
