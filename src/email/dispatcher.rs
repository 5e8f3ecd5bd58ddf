use std::sync::Arc;
use std::time::Instant;

use crate::config::SenderConfig;
use crate::metrics::{DispatchMetrics, TemplateMetrics};
use crate::template::{RenderContext, TemplateResolver};

use super::context::ContextBuilder;
use super::transport::MailTransport;
use super::types::{
    CustomEmailPayload, CustomRequest, DispatchError, DispatchResult, EmailRequest,
    ResolvedMessage, SentEmail, WelcomeEmailPayload, WelcomeRequest,
};

/// Template used for welcome emails
pub const WELCOME_TEMPLATE: &str = "welcome";

/// Subject line of welcome emails
pub const WELCOME_SUBJECT: &str = "Welcome to our platform!";

/// Sender identity applied to every outgoing message. Never taken from
/// the request.
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    pub from: String,
    pub reply_to: Option<String>,
}

impl From<&SenderConfig> for SenderIdentity {
    fn from(config: &SenderConfig) -> Self {
        Self {
            from: config.from.clone(),
            reply_to: config.reply_to.clone(),
        }
    }
}

/// Turns email requests into transport calls.
///
/// Each dispatch validates the request, builds the render context,
/// resolves and renders the template, and hands the message to the
/// transport. Any failure ends the dispatch; nothing is retried.
pub struct EmailDispatcher {
    sender: SenderIdentity,
    contexts: ContextBuilder,
    templates: Arc<TemplateResolver>,
    transport: Arc<dyn MailTransport>,
}

impl EmailDispatcher {
    pub fn new(
        sender: SenderIdentity,
        contexts: ContextBuilder,
        templates: Arc<TemplateResolver>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            sender,
            contexts,
            templates,
            transport,
        }
    }

    pub fn templates(&self) -> &Arc<TemplateResolver> {
        &self.templates
    }

    pub fn transport(&self) -> &Arc<dyn MailTransport> {
        &self.transport
    }

    /// Validate and send a welcome email
    pub async fn send_welcome(&self, payload: WelcomeEmailPayload) -> DispatchResult {
        let request = WelcomeRequest::try_from(payload).inspect_err(rejected)?;
        self.dispatch(EmailRequest::Welcome(request)).await
    }

    /// Validate and send a templated email
    pub async fn send_custom(&self, payload: CustomEmailPayload) -> DispatchResult {
        let request = CustomRequest::try_from(payload).inspect_err(rejected)?;
        self.dispatch(EmailRequest::Custom(request)).await
    }

    /// Send an already validated request
    pub async fn dispatch(&self, request: EmailRequest) -> DispatchResult {
        let started = Instant::now();

        let (to, subject, template, context) = match request {
            EmailRequest::Welcome(r) => {
                let context = self
                    .contexts
                    .build_welcome(r.username(), r.verification_link());
                (
                    r.to().to_string(),
                    WELCOME_SUBJECT.to_string(),
                    WELCOME_TEMPLATE.to_string(),
                    context,
                )
            }
            EmailRequest::Custom(r) => {
                let context = self.contexts.build(r.context());
                (
                    r.to().to_string(),
                    r.subject().to_string(),
                    r.template().to_string(),
                    context,
                )
            }
        };

        let result = self.deliver(to, subject, template.clone(), context).await;
        DispatchMetrics::observe_latency(started.elapsed());

        match &result {
            Ok(sent) => {
                DispatchMetrics::record_sent(&template);
                tracing::info!(
                    template = %template,
                    recipient = %sent.recipient,
                    message_id = %sent.message_id,
                    "Email sent"
                );
            }
            Err(e) => {
                DispatchMetrics::record_failed(e.kind);
                tracing::error!(
                    template = %template,
                    kind = %e.kind,
                    detail = %e.detail,
                    "Email dispatch failed"
                );
            }
        }

        result
    }

    #[tracing::instrument(
        name = "email.deliver",
        skip(self, subject, context),
        fields(transport = self.transport.name())
    )]
    async fn deliver(
        &self,
        to: String,
        subject: String,
        template: String,
        context: RenderContext,
    ) -> DispatchResult {
        let renderer = self.templates.resolve(&template).await?;
        TemplateMetrics::set_cached(self.templates.cached_count());

        let rendered_body = renderer.render(&context)?;

        let message = ResolvedMessage {
            from: self.sender.from.clone(),
            to,
            reply_to: self.sender.reply_to.clone(),
            subject,
            template_name: template,
            rendered_body,
        };

        let message_id = self.transport.send(&message).await?;

        Ok(SentEmail {
            message_id,
            recipient: message.to,
        })
    }
}

fn rejected(err: &DispatchError) {
    DispatchMetrics::record_failed(err.kind);
    tracing::warn!(detail = %err.detail, "Email request rejected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::email::{ErrorKind, MemoryTransport};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        transport: Arc<MemoryTransport>,
        dispatcher: EmailDispatcher,
    }

    fn fixture(transport: MemoryTransport) -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("emails");
        let layouts = dir.path().join("layouts");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&layouts).unwrap();
        fs::write(
            layouts.join("main.html"),
            "{{ body }}|{{ company_name }}|{{ current_year }}",
        )
        .unwrap();
        fs::write(
            root.join("welcome.html"),
            "Hi {{ username }} <a href=\"{{ verification_link }}\">verify</a>",
        )
        .unwrap();
        fs::write(root.join("notice.html"), "{{ message }} from {{ company_name }}").unwrap();

        let templates = Arc::new(TemplateResolver::new(&TemplateConfig {
            root,
            layouts,
            partials: dir.path().join("partials"),
            layout: "main".to_string(),
            preload: vec![],
        }));
        let transport = Arc::new(transport);
        let dispatcher = EmailDispatcher::new(
            SenderIdentity {
                from: "noreply@acme.test".to_string(),
                reply_to: Some("support@acme.test".to_string()),
            },
            ContextBuilder::new("Acme").with_year_source(|| 2025),
            templates,
            transport.clone(),
        );

        Fixture {
            _dir: dir,
            transport,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_welcome_dispatch() {
        let f = fixture(MemoryTransport::with_message_id("msg-1"));

        let sent = f
            .dispatcher
            .send_welcome(WelcomeEmailPayload {
                to: Some("user@example.com".to_string()),
                username: Some("John Doe".to_string()),
                verification_link: Some("https://app/verify?token=abc123".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(sent.message_id, "msg-1");
        assert_eq!(sent.recipient, "user@example.com");

        let message = f.transport.last().unwrap();
        assert_eq!(message.from, "noreply@acme.test");
        assert_eq!(message.reply_to.as_deref(), Some("support@acme.test"));
        assert_eq!(message.subject, WELCOME_SUBJECT);
        assert_eq!(message.template_name, "welcome");
        assert_eq!(
            message.rendered_body,
            "Hi John Doe <a href=\"https://app/verify?token=abc123\">verify</a>|Acme|2025"
        );
    }

    #[tokio::test]
    async fn test_welcome_without_link_uses_placeholder() {
        let f = fixture(MemoryTransport::new());

        f.dispatcher
            .send_welcome(WelcomeEmailPayload {
                to: Some("user@example.com".to_string()),
                username: Some("Ann".to_string()),
                verification_link: None,
            })
            .await
            .unwrap();

        let message = f.transport.last().unwrap();
        assert!(message.rendered_body.contains("href=\"#\""));
    }

    #[tokio::test]
    async fn test_welcome_validation_skips_transport() {
        let f = fixture(MemoryTransport::new());

        let err = f
            .dispatcher
            .send_welcome(WelcomeEmailPayload {
                to: Some("user@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(f.transport.attempts(), 0);
        assert_eq!(f.dispatcher.templates().cached_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_dispatch_overrides_injected_keys() {
        let f = fixture(MemoryTransport::new());

        let context = json!({"message": "Hello", "company_name": "Evil Corp", "current_year": 1999});
        f.dispatcher
            .send_custom(CustomEmailPayload {
                to: Some("a@b.com".to_string()),
                subject: Some("Notice".to_string()),
                template: Some("notice".to_string()),
                context: context.as_object().cloned(),
            })
            .await
            .unwrap();

        let message = f.transport.last().unwrap();
        assert_eq!(message.subject, "Notice");
        assert_eq!(message.rendered_body, "Hello from Acme|Acme|2025");
        assert!(!message.rendered_body.contains("Evil Corp"));
        assert!(!message.rendered_body.contains("1999"));
    }

    #[tokio::test]
    async fn test_custom_validation_skips_transport() {
        let f = fixture(MemoryTransport::new());

        let err = f
            .dispatcher
            .send_custom(CustomEmailPayload {
                to: Some("a@b.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.detail, "to, subject, and template are required");
        assert_eq!(f.transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_unknown_template_skips_transport() {
        let f = fixture(MemoryTransport::new());

        let err = f
            .dispatcher
            .send_custom(CustomEmailPayload {
                to: Some("a@b.com".to_string()),
                subject: Some("Hi".to_string()),
                template: Some("does-not-exist".to_string()),
                context: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::TemplateNotFound);
        assert_eq!(err.detail, "Template not found: does-not-exist");
        assert_eq!(f.transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let f = fixture(MemoryTransport::failing("550 mailbox unavailable"));

        let err = f
            .dispatcher
            .send_welcome(WelcomeEmailPayload {
                to: Some("user@example.com".to_string()),
                username: Some("Ann".to_string()),
                verification_link: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Transport);
        assert!(err.detail.contains("550 mailbox unavailable"));
        assert_eq!(f.transport.attempts(), 1);
    }
}
