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
    /// Uploaded file storage.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Session token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outgoing email. Email notifications are disabled when absent.
    #[serde(default)]
    pub email: Option<EmailSettings>,
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
    /// Public URL of this panel.
    pub url: String,
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

/// Where donation and announcement uploads live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Base directory for stored files.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// Base URL the files are served from.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
        }
    }
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Cookie lifetime in seconds.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: i64,
    /// Mark the cookie `Secure`.
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age(),
            secure_cookie: false,
        }
    }
}

/// Outgoing email settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Delivery provider.
    pub provider: EmailProviderSettings,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Reply-to address.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Site name used in templates.
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// Site URL used in templates.
    pub site_url: String,
}

/// Provider-specific email settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmailProviderSettings {
    /// SMTP relay.
    Smtp {
        /// SMTP host.
        host: String,
        /// SMTP port.
        #[serde(default = "default_smtp_port")]
        port: u16,
        /// Use STARTTLS.
        #[serde(default = "default_true")]
        use_tls: bool,
        /// Username.
        #[serde(default)]
        username: Option<String>,
        /// Password.
        #[serde(default)]
        password: Option<String>,
    },
    /// `SendGrid` HTTP API.
    SendGrid {
        /// API key.
        api_key: String,
    },
    /// Mailgun HTTP API.
    Mailgun {
        /// API key.
        api_key: String,
        /// Sending domain.
        domain: String,
        /// Use the EU endpoint.
        #[serde(default)]
        eu_region: bool,
    },
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_storage_url() -> String {
    "/uploads".to_string()
}

fn default_cookie_name() -> String {
    "token".to_string()
}

const fn default_cookie_max_age() -> i64 {
    60 * 60 * 24 * 7
}

fn default_from_name() -> String {
    "Foodify Team".to_string()
}

fn default_site_name() -> String {
    "Foodify".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FOODIFY_ENV`)
    /// 4. Environment variables with `FOODIFY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("FOODIFY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FOODIFY")
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
                config::Environment::with_prefix("FOODIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
