//! Configuration loading

use anyhow::{Context, Result, ensure};
use config::{Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Built-in signing secret; running with it is insecure
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_EXPIRY_HOURS: i64 = 24 * 365;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Upper bound on pooled connections; extra callers wait
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: i64,
    /// Require a bearer token on the resource endpoints
    #[serde(default = "default_true")]
    pub protect_resources: bool,
    /// Administrator created on first start when no users exist
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_expiry_hours: default_token_expiry_hours(),
            protect_resources: true,
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            admin_name: default_admin_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_url() -> String {
    "sqlite:./data/crm.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_expiry_hours() -> i64 {
    24
}

fn default_admin_email() -> String {
    "admin@crm.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file layered with `CRM__` env vars
    ///
    /// A missing file falls back to the built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            info!("Loading configuration from {}", path);
        } else {
            info!("Config file not found at {}, using defaults", path);
        }

        let settings = config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("CRM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration: {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later at request time
    fn validate(&self) -> Result<()> {
        let hours = self.auth.token_expiry_hours;
        ensure!(
            (1..=MAX_TOKEN_EXPIRY_HOURS).contains(&hours),
            "auth.token_expiry_hours must be between 1 and {}, got {}",
            MAX_TOKEN_EXPIRY_HOURS,
            hours
        );
        Ok(())
    }

    /// Whether the signing secret is still the built-in one
    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}
