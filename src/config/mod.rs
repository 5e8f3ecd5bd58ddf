mod settings;

pub use settings::{
    LoggingConfig, SenderConfig, ServerConfig, Settings, SmtpConfig, TemplateConfig,
    DEFAULT_COMPANY_NAME,
};
