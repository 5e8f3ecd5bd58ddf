//! Email sending endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::email::{CustomEmailPayload, SentEmail, WelcomeEmailPayload};
use crate::error::Result;
use crate::server::AppState;

use super::payload::JsonPayload;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub recipient: String,
}

impl SendEmailResponse {
    fn new(message: &str, sent: SentEmail) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            message_id: sent.message_id,
            recipient: sent.recipient,
        }
    }
}

/// POST /send-welcome-email - Send the welcome email
#[tracing::instrument(name = "http.send_welcome_email", skip(state, payload))]
pub async fn send_welcome_email(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<WelcomeEmailPayload>,
) -> Result<Json<SendEmailResponse>> {
    let sent = state.dispatcher.send_welcome(payload).await?;

    Ok(Json(SendEmailResponse::new(
        "Welcome email sent successfully",
        sent,
    )))
}

/// POST /send-email - Send an email rendered from a named template
#[tracing::instrument(
    name = "http.send_email",
    skip(state, payload),
    fields(template = ?payload.template)
)]
pub async fn send_email(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<CustomEmailPayload>,
) -> Result<Json<SendEmailResponse>> {
    let sent = state.dispatcher.send_custom(payload).await?;

    Ok(Json(SendEmailResponse::new("Email sent successfully", sent)))
}
