use std::sync::Arc;

use crate::config::Settings;
use crate::email::{
    create_transport, ContextBuilder, EmailDispatcher, MailTransport, SenderIdentity,
    TransportError,
};
use crate::template::TemplateResolver;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<EmailDispatcher>,
}

impl AppState {
    /// Build the state with the transport selected by configuration
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let transport = create_transport(&settings.smtp)?;
        Ok(Self::with_transport(settings, transport))
    }

    /// Build the state around an existing transport
    pub fn with_transport(settings: &Settings, transport: Arc<dyn MailTransport>) -> Self {
        let templates = Arc::new(TemplateResolver::new(&settings.templates));
        let contexts = ContextBuilder::new(settings.sender.company_name.clone());
        let dispatcher = Arc::new(EmailDispatcher::new(
            SenderIdentity::from(&settings.sender),
            contexts,
            templates,
            transport,
        ));

        Self { dispatcher }
    }
}
