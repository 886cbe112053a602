//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration (job queue broker).
    pub redis: RedisConfig,
    /// Outbound email configuration.
    pub email: EmailSettings,
    /// File storage configuration.
    pub storage: StorageSettings,
    /// Notification configuration.
    pub notifications: NotificationSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this registry.
    pub url: String,
    /// Base URL of the user-facing frontend (password reset links).
    pub frontend_url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Outbound email settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Whether outbound email is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Delivery provider: "smtp", "sendgrid" or "mailgun".
    #[serde(default = "default_email_provider")]
    pub provider: String,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use STARTTLS on the SMTP connection.
    #[serde(default = "default_true")]
    pub smtp_starttls: bool,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// SendGrid API key.
    #[serde(default)]
    pub sendgrid_api_key: Option<String>,
    /// Mailgun API key.
    #[serde(default)]
    pub mailgun_api_key: Option<String>,
    /// Mailgun domain.
    #[serde(default)]
    pub mailgun_domain: Option<String>,
    /// Use the Mailgun EU region.
    #[serde(default)]
    pub mailgun_eu_region: bool,
    /// From address for all outbound mail.
    pub from_address: String,
    /// Display name for the From address.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Reply-to address for support-facing mail.
    #[serde(default)]
    pub support_address: Option<String>,
    /// Files attached to the welcome email (onboarding guides).
    #[serde(default)]
    pub welcome_attachments: Vec<PathBuf>,
}

/// File storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Base directory for stored files.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// Base URL for serving stored files.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

/// Notification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// Display name of the application used in email templates.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Administrator distribution list for event emails.
    #[serde(default)]
    pub admin_emails: Vec<String>,
    /// Base URL of the administrative console, linked from admin emails.
    #[serde(default)]
    pub admin_base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "afrec".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_email_provider() -> String {
    "smtp".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_from_name() -> String {
    "Africa RECs".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_storage_url() -> String {
    "/media".to_string()
}

fn default_app_name() -> String {
    "Africa RECs International".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `AFREC_ENV`)
    /// 3. Environment variables with `AFREC_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("AFREC_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AFREC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AFREC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
