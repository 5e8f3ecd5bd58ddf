//! Email request, message, and error types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::template::TemplateError;

/// Raw body of `POST /send-welcome-email`. Every field is optional so that
/// missing fields are reported as validation failures, not parse errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmailPayload {
    pub to: Option<String>,
    pub username: Option<String>,
    pub verification_link: Option<String>,
}

/// Raw body of `POST /send-email`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomEmailPayload {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub template: Option<String>,
    pub context: Option<Map<String, Value>>,
}

/// Validated welcome email request
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeRequest {
    to: String,
    username: String,
    verification_link: Option<String>,
}

/// Validated templated email request
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRequest {
    to: String,
    subject: String,
    template: String,
    context: Map<String, Value>,
}

/// A validated request to send one email
#[derive(Debug, Clone, PartialEq)]
pub enum EmailRequest {
    Welcome(WelcomeRequest),
    Custom(CustomRequest),
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl TryFrom<WelcomeEmailPayload> for WelcomeRequest {
    type Error = DispatchError;

    fn try_from(payload: WelcomeEmailPayload) -> Result<Self, Self::Error> {
        if !(present(&payload.to) && present(&payload.username)) {
            return Err(DispatchError::validation("to and username are required"));
        }

        Ok(WelcomeRequest {
            to: payload.to.unwrap_or_default(),
            username: payload.username.unwrap_or_default(),
            verification_link: payload.verification_link.filter(|l| !l.is_empty()),
        })
    }
}

impl TryFrom<CustomEmailPayload> for CustomRequest {
    type Error = DispatchError;

    fn try_from(payload: CustomEmailPayload) -> Result<Self, Self::Error> {
        if !(present(&payload.to) && present(&payload.subject) && present(&payload.template)) {
            return Err(DispatchError::validation(
                "to, subject, and template are required",
            ));
        }

        Ok(CustomRequest {
            to: payload.to.unwrap_or_default(),
            subject: payload.subject.unwrap_or_default(),
            template: payload.template.unwrap_or_default(),
            context: payload.context.unwrap_or_default(),
        })
    }
}

impl WelcomeRequest {
    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn verification_link(&self) -> Option<&str> {
        self.verification_link.as_deref()
    }
}

impl CustomRequest {
    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }
}

/// A fully resolved message handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMessage {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub template_name: String,
    pub rendered_body: String,
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    pub message_id: String,
    pub recipient: String,
}

/// Failure categories reported by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    TemplateNotFound,
    TemplateCompile,
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::TemplateNotFound => "template_not_found",
            ErrorKind::TemplateCompile => "template_compile",
            ErrorKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed dispatch. `detail` carries the underlying message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl DispatchError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, detail)
    }
}

impl From<TemplateError> for DispatchError {
    fn from(err: TemplateError) -> Self {
        let kind = match &err {
            TemplateError::NotFound(_) => ErrorKind::TemplateNotFound,
            TemplateError::Compile { .. }
            | TemplateError::Render { .. }
            | TemplateError::Io { .. } => ErrorKind::TemplateCompile,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        Self::new(ErrorKind::Transport, err.to_string())
    }
}

/// Result of one dispatch
pub type DispatchResult = Result<SentEmail, DispatchError>;

/// Mail transport error type
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid {field} address '{address}': {detail}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        detail: String,
    },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Transport rejected message: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn welcome(to: Option<&str>, username: Option<&str>) -> WelcomeEmailPayload {
        WelcomeEmailPayload {
            to: to.map(String::from),
            username: username.map(String::from),
            verification_link: None,
        }
    }

    #[test]
    fn test_welcome_requires_to_and_username() {
        for payload in [
            welcome(None, Some("John")),
            welcome(Some("a@b.com"), None),
            welcome(Some(""), Some("John")),
            welcome(Some("a@b.com"), Some("   ")),
            welcome(None, None),
        ] {
            let err = WelcomeRequest::try_from(payload).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.detail, "to and username are required");
        }
    }

    #[test]
    fn test_welcome_keeps_values_verbatim() {
        let request = WelcomeRequest::try_from(WelcomeEmailPayload {
            to: Some("user@example.com".to_string()),
            username: Some(" John Doe ".to_string()),
            verification_link: Some(String::new()),
        })
        .unwrap();

        assert_eq!(request.to(), "user@example.com");
        assert_eq!(request.username(), " John Doe ");
        assert_eq!(request.verification_link(), None);
    }

    #[test]
    fn test_custom_requires_all_fields() {
        let complete = CustomEmailPayload {
            to: Some("a@b.com".to_string()),
            subject: Some("Hi".to_string()),
            template: Some("notification".to_string()),
            context: None,
        };
        assert!(CustomRequest::try_from(complete.clone()).is_ok());

        let missing = [
            CustomEmailPayload { to: None, ..complete.clone() },
            CustomEmailPayload { subject: None, ..complete.clone() },
            CustomEmailPayload { template: Some(String::new()), ..complete.clone() },
        ];
        for payload in missing {
            let err = CustomRequest::try_from(payload).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.detail, "to, subject, and template are required");
        }
    }

    #[test]
    fn test_custom_context_defaults_to_empty() {
        let request = CustomRequest::try_from(CustomEmailPayload {
            to: Some("a@b.com".to_string()),
            subject: Some("Hi".to_string()),
            template: Some("notification".to_string()),
            context: None,
        })
        .unwrap();
        assert!(request.context().is_empty());
    }

    #[test]
    fn test_payload_uses_camel_case() {
        let payload: WelcomeEmailPayload = serde_json::from_value(json!({
            "to": "a@b.com",
            "username": "Ann",
            "verificationLink": "https://x/v"
        }))
        .unwrap();
        assert_eq!(payload.verification_link.as_deref(), Some("https://x/v"));
    }

    #[test]
    fn test_template_error_kinds() {
        let not_found: DispatchError = TemplateError::NotFound("x".to_string()).into();
        assert_eq!(not_found.kind, ErrorKind::TemplateNotFound);
        assert_eq!(not_found.detail, "Template not found: x");

        let compile: DispatchError = TemplateError::Compile {
            name: "x".to_string(),
            detail: "bad".to_string(),
        }
        .into();
        assert_eq!(compile.kind, ErrorKind::TemplateCompile);
    }

    #[test]
    fn test_transport_error_detail_is_preserved() {
        let err: DispatchError = TransportError::Smtp("connection refused".to_string()).into();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.detail, "SMTP error: connection refused");
    }
}
