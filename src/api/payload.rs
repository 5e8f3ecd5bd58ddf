//! JSON body extraction with the service's error taxonomy.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::email::DispatchError;
use crate::error::AppError;

/// JSON body extractor.
///
/// An empty body is read as `{}` so that missing fields are reported by
/// request validation. Bodies that are not JSON are rejected as invalid;
/// JSON of the wrong shape is rejected as a validation failure.
#[derive(Debug, Clone)]
pub struct JsonPayload<T>(pub T);

impl<S, T> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidBody(e.body_text()))?;

        parse(&bytes).map(JsonPayload)
    }
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(bytes).map_err(|e| AppError::InvalidBody(e.to_string()))?
    };

    serde_json::from_value(value)
        .map_err(|e| AppError::Dispatch(DispatchError::validation(e.to_string())))
}
