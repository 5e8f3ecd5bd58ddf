//! Templated email dispatch.
//!
//! Requests flow through validation, context building, template
//! resolution, rendering, and finally the mail transport. The outcome is
//! either a [`SentEmail`] or a [`DispatchError`] tagged with an
//! [`ErrorKind`].

mod context;
mod dispatcher;
mod memory;
mod transport;
mod types;

pub use context::{
    ContextBuilder, COMPANY_NAME_KEY, CURRENT_YEAR_KEY, MISSING_LINK_PLACEHOLDER,
};
pub use dispatcher::{EmailDispatcher, SenderIdentity, WELCOME_SUBJECT, WELCOME_TEMPLATE};
pub use memory::MemoryTransport;
pub use transport::{create_transport, MailTransport, SmtpMailTransport};
pub use types::{
    CustomEmailPayload, CustomRequest, DispatchError, DispatchResult, EmailRequest, ErrorKind,
    ResolvedMessage, SentEmail, TransportError, WelcomeEmailPayload, WelcomeRequest,
};
