//! Email template system.
//!
//! This module provides:
//! - Template resolution from a template root plus a shared layout
//! - A compiled-template cache populated on first use and never invalidated
//! - Rendering with permissive substitution (undefined variables render empty)
//!
//! # Example
//!
//! ```ignore
//! let resolver = TemplateResolver::new(&settings.templates);
//!
//! let mut context = RenderContext::new();
//! context.insert("username", "Ann");
//! context.insert("company_name", "Acme");
//!
//! let renderer = resolver.resolve("welcome").await?;
//! let html = renderer.render(&context)?;
//! ```

mod context;
mod renderer;
mod resolver;
mod types;

pub use context::RenderContext;
pub use renderer::{Renderer, BODY_SLOT};
pub use resolver::TemplateResolver;
pub use types::{validate_name, TemplateError, TemplateResult};
