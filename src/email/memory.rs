//! In-memory mail transport

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::transport::MailTransport;
use super::types::{ResolvedMessage, TransportError};

/// Transport that keeps messages in memory instead of delivering them.
///
/// Useful for local development (`EMAIL_TRANSPORT=memory`) and as a test
/// double: it counts invocations and can be told to reject every message.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<ResolvedMessage>>,
    attempts: AtomicUsize,
    message_id: Option<String>,
    failure: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with the given message id
    pub fn with_message_id(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            ..Self::default()
        }
    }

    /// Reject every message with the given reason
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Number of times `send` was called, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages accepted so far
    pub fn sent(&self) -> Vec<ResolvedMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Most recently accepted message
    pub fn last(&self) -> Option<ResolvedMessage> {
        self.sent().pop()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &ResolvedMessage) -> Result<String, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(TransportError::Rejected(reason.clone()));
        }

        let message_id = self
            .message_id
            .clone()
            .unwrap_or_else(|| format!("<{}@memory>", Uuid::new_v4()));

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }

        tracing::debug!(
            to = %message.to,
            template = %message.template_name,
            message_id = %message_id,
            "Message stored by memory transport"
        );

        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ResolvedMessage {
        ResolvedMessage {
            from: "noreply@acme.test".to_string(),
            to: "user@example.com".to_string(),
            reply_to: None,
            subject: "Hi".to_string(),
            template_name: "notification".to_string(),
            rendered_body: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_messages() {
        let transport = MemoryTransport::with_message_id("msg-1");

        let id = transport.send(&message()).await.unwrap();
        assert_eq!(id, "msg-1");
        assert_eq!(transport.attempts(), 1);
        assert_eq!(transport.last(), Some(message()));
    }

    #[tokio::test]
    async fn test_generates_ids() {
        let transport = MemoryTransport::new();

        let first = transport.send(&message()).await.unwrap();
        let second = transport.send(&message()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MemoryTransport::failing("mailbox unavailable");

        let err = transport.send(&message()).await.unwrap_err();
        assert_eq!(err.to_string(), "Transport rejected message: mailbox unavailable");
        assert_eq!(transport.attempts(), 1);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_verify_always_succeeds() {
        let transport = MemoryTransport::failing("mailbox unavailable");
        assert!(tokio_test::block_on(transport.verify()).is_ok());
        assert_eq!(transport.name(), "memory");
    }
}
