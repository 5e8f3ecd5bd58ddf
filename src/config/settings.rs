use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Immutable service configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub smtp: SmtpConfig,
    pub sender: SenderConfig,
    pub templates: TemplateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Transport backend: `"smtp"` (default) or `"memory"`
    pub backend: String,
    pub host: String,
    pub port: u16,
    /// Implicit TLS (SMTPS). Only the literal string `"true"` enables it.
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Socket timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub from: String,
    pub reply_to: Option<String>,
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub root: PathBuf,
    pub layouts: PathBuf,
    pub partials: PathBuf,
    pub layout: String,
    /// Templates compiled at startup
    pub preload: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub json: bool,
}

/// Flat view of the environment. Variable names map one-to-one to fields
/// (`EMAIL_REPLY_TO` -> `email_reply_to`).
#[derive(Debug, Deserialize)]
struct RawSettings {
    host: String,
    port: u16,
    email_transport: String,
    email_host: String,
    email_port: u16,
    email_secure: Option<String>,
    email_user: Option<String>,
    email_pass: Option<String>,
    email_from: Option<String>,
    email_reply_to: Option<String>,
    email_timeout_secs: u64,
    company_name: Option<String>,
    templates_dir: String,
    layouts_dir: String,
    partials_dir: String,
    default_layout: String,
    preload_templates: Option<String>,
    log_format: Option<String>,
}

pub const DEFAULT_COMPANY_NAME: &str = "Your Company";

const DEFAULT_FROM: &str = "noreply@localhost";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("email_transport", "smtp")?
            .set_default("email_host", "smtp.gmail.com")?
            .set_default("email_port", 587)?
            .set_default("email_timeout_secs", 30)?
            .set_default("templates_dir", "templates/emails")?
            .set_default("layouts_dir", "templates/layouts")?
            .set_default("partials_dir", "templates/partials")?
            .set_default("default_layout", "main")?
            .set_default("preload_templates", "welcome")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment values stay strings so EMAIL_SECURE is compared verbatim
            .add_source(Environment::default().try_parsing(false));

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Ok(raw.into())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let username = non_empty(raw.email_user);
        let from = non_empty(raw.email_from)
            .or_else(|| username.clone())
            .unwrap_or_else(|| DEFAULT_FROM.to_string());

        let preload = raw
            .preload_templates
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Settings {
            server: ServerConfig {
                host: raw.host,
                port: raw.port,
            },
            smtp: SmtpConfig {
                backend: raw.email_transport.to_lowercase(),
                host: raw.email_host,
                port: raw.email_port,
                secure: raw.email_secure.as_deref() == Some("true"),
                username,
                password: non_empty(raw.email_pass),
                timeout_secs: raw.email_timeout_secs,
            },
            sender: SenderConfig {
                from,
                reply_to: non_empty(raw.email_reply_to),
                company_name: non_empty(raw.company_name)
                    .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            },
            templates: TemplateConfig {
                root: PathBuf::from(raw.templates_dir),
                layouts: PathBuf::from(raw.layouts_dir),
                partials: PathBuf::from(raw.partials_dir),
                layout: raw.default_layout,
                preload,
            },
            logging: LoggingConfig {
                json: raw
                    .log_format
                    .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            backend: "smtp".to_string(),
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM.to_string(),
            reply_to: None,
            company_name: DEFAULT_COMPANY_NAME.to_string(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates/emails"),
            layouts: PathBuf::from("templates/layouts"),
            partials: PathBuf::from("templates/partials"),
            layout: "main".to_string(),
            preload: vec!["welcome".to_string()],
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            smtp: SmtpConfig::default(),
            sender: SenderConfig::default(),
            templates: TemplateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
