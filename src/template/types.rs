//! Template error definitions

use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to compile template {name}: {detail}")]
    Compile { name: String, detail: String },

    #[error("Failed to render template {name}: {detail}")]
    Render { name: String, detail: String },

    #[error("Failed to read template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Check that a template name is safe to map onto the template root.
///
/// Names are 1-64 characters of ASCII alphanumerics, dash, or underscore.
/// Anything else is treated as not found so that caller-supplied names
/// cannot escape the root directory.
pub fn validate_name(name: &str) -> TemplateResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(TemplateError::NotFound(name.to_string()))
    }
}
