//! Render context assembly with system-injected defaults

use chrono::{Datelike, Utc};
use serde_json::{Map, Value};

use crate::config::DEFAULT_COMPANY_NAME;
use crate::template::RenderContext;

/// Context key holding the configured company name
pub const COMPANY_NAME_KEY: &str = "company_name";

/// Context key holding the current four-digit year
pub const CURRENT_YEAR_KEY: &str = "current_year";

/// Placeholder used when a welcome request has no verification link
pub const MISSING_LINK_PLACEHOLDER: &str = "#";

fn current_year() -> i32 {
    Utc::now().year()
}

/// Builds render contexts for outgoing emails.
///
/// `company_name` and `current_year` are written last and always replace
/// caller-supplied values under the same keys.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    company_name: String,
    year: fn() -> i32,
}

impl ContextBuilder {
    pub fn new(company_name: impl Into<String>) -> Self {
        let company_name = company_name.into();
        let company_name = if company_name.trim().is_empty() {
            DEFAULT_COMPANY_NAME.to_string()
        } else {
            company_name
        };

        Self {
            company_name,
            year: current_year,
        }
    }

    /// Replace the wall-clock year source
    pub fn with_year_source(mut self, year: fn() -> i32) -> Self {
        self.year = year;
        self
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// Context for a templated email: caller variables plus injected defaults
    pub fn build(&self, caller: &Map<String, Value>) -> RenderContext {
        let mut context = RenderContext::from(caller.clone());
        self.inject(&mut context);
        context
    }

    /// Context for the welcome email, built only from its named fields
    pub fn build_welcome(&self, username: &str, verification_link: Option<&str>) -> RenderContext {
        let mut context = RenderContext::new();
        context.insert("username", username);
        context.insert(
            "verification_link",
            verification_link.unwrap_or(MISSING_LINK_PLACEHOLDER),
        );
        self.inject(&mut context);
        context
    }

    fn inject(&self, context: &mut RenderContext) {
        context.insert(COMPANY_NAME_KEY, self.company_name.as_str());
        context.insert(CURRENT_YEAR_KEY, (self.year)());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ContextBuilder {
        ContextBuilder::new("Acme").with_year_source(|| 2025)
    }

    #[test]
    fn test_injected_keys_override_caller() {
        let caller = json!({
            "company_name": "Evil Corp",
            "current_year": 1999,
            "order_id": "ORD-1"
        });
        let caller = caller.as_object().unwrap();

        let context = builder().build(caller);
        assert_eq!(context.get(COMPANY_NAME_KEY), Some(&json!("Acme")));
        assert_eq!(context.get(CURRENT_YEAR_KEY), Some(&json!(2025)));
        assert_eq!(context.get("order_id"), Some(&json!("ORD-1")));
        assert_eq!(context.len(), 3);
    }

    #[test]
    fn test_caller_map_is_not_modified() {
        let caller = json!({"company_name": "Evil Corp"});
        let caller = caller.as_object().unwrap();

        let _ = builder().build(caller);
        assert_eq!(caller["company_name"], "Evil Corp");
    }

    #[test]
    fn test_welcome_context_fields() {
        let context = builder().build_welcome("John Doe", Some("https://app/verify?token=abc123"));

        assert_eq!(context.get("username"), Some(&json!("John Doe")));
        assert_eq!(
            context.get("verification_link"),
            Some(&json!("https://app/verify?token=abc123"))
        );
        assert_eq!(context.get(COMPANY_NAME_KEY), Some(&json!("Acme")));
        assert_eq!(context.get(CURRENT_YEAR_KEY), Some(&json!(2025)));
        assert_eq!(context.len(), 4);
    }

    #[test]
    fn test_welcome_link_placeholder() {
        let context = builder().build_welcome("Ann", None);
        assert_eq!(context.get("verification_link"), Some(&json!("#")));
    }

    #[test]
    fn test_company_name_fallback() {
        let builder = ContextBuilder::new("  ");
        assert_eq!(builder.company_name(), DEFAULT_COMPANY_NAME);
    }

    #[test]
    fn test_default_year_is_wall_clock() {
        let context = ContextBuilder::new("Acme").build(&Map::new());
        assert_eq!(context.get(CURRENT_YEAR_KEY), Some(&json!(Utc::now().year())));
    }
}
