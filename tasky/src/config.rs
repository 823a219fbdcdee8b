//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `TASKY_`, nested with `__`, e.g. `TASKY_STORE__URL`)
//! 2. Deployment variables `APP_PORT`, `MONGO_HOST`, `MONGO_PORT`, `MONGO_USERNAME`,
//!    `MONGO_PASSWORD` and `MONGO_DBNAME`
//! 3. An explicit file passed with `--config`, else `./config.toml`,
//!    else `~/.config/tasky/config.toml`
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variables that select the production profile, in which `.env` is ignored
const ENVIRONMENT_VARS: &[&str] = &["TASKY_ENV", "GO_ENV"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable multi-line output
    Pretty,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Maximum request body size in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Generate and propagate `x-request-id`
    #[serde(default = "default_true")]
    pub request_id_enabled: bool,

    /// Mask credentials headers in traces
    #[serde(default = "default_true")]
    pub mask_sensitive_headers: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            request_id_enabled: true,
            mask_sensitive_headers: true,
        }
    }
}

impl MiddlewareConfig {
    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL (`ws://`, `http://`, `mem://`)
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Namespace to select after connecting
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Database to select after connecting
    #[serde(default = "default_database")]
    pub database: String,

    /// Root username, sign-in is skipped when unset
    #[serde(default)]
    pub username: Option<String>,

    /// Root password
    #[serde(default)]
    pub password: Option<String>,

    /// Connection attempts before giving up at startup
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay between connection attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Deadline for each CRUD operation in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Deadline for the readiness ping in seconds
    #[serde(default = "default_readiness_timeout")]
    pub readiness_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            operation_timeout_secs: default_operation_timeout(),
            readiness_timeout_secs: default_readiness_timeout(),
        }
    }
}

impl StoreConfig {
    /// Deadline for CRUD operations
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Deadline for the readiness ping
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    /// Initial backoff between connection attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_store_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_namespace() -> String {
    "tasky".to_string()
}

fn default_database() -> String {
    "tasky".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_operation_timeout() -> u64 {
    10
}

fn default_readiness_timeout() -> u64 {
    2
}

impl Config {
    /// Load configuration from all sources, searching the default file locations
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load configuration using an explicit file instead of the search paths
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        Self::load_with(Some(path))
    }

    fn load_with(file: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the layered provider stack
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match file.map(Path::to_path_buf).or_else(Self::find_config_file) {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => tracing::debug!("No configuration file found, using defaults"),
        }

        figment = figment.merge(Self::deployment_env());
        if let Some(url) = Self::deployment_store_url() {
            figment = figment.merge(Serialized::default("store.url", url));
        }

        // Prefixed variables have highest priority
        figment.merge(Env::prefixed("TASKY_").split("__"))
    }

    /// First existing config file: `./config.toml`, then the XDG config directory
    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Some(local);
        }

        xdg::BaseDirectories::with_prefix("tasky").find_config_file("config.toml")
    }

    /// Plain deployment variables mapped onto their configuration keys
    fn deployment_env() -> Env {
        Env::raw()
            .only(&[
                "APP_PORT",
                "MONGO_USERNAME",
                "MONGO_PASSWORD",
                "MONGO_DBNAME",
            ])
            .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
                "APP_PORT" => "service.port".into(),
                "MONGO_USERNAME" => "store.username".into(),
                "MONGO_PASSWORD" => "store.password".into(),
                _ => "store.database".into(),
            })
    }

    /// `MONGO_HOST`/`MONGO_PORT` combined into a store URL
    fn deployment_store_url() -> Option<String> {
        let host = std::env::var("MONGO_HOST").ok().filter(|h| !h.is_empty())?;
        let port = std::env::var("MONGO_PORT")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "8000".to_string());
        Some(format!("ws://{}:{}", host, port))
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::from(figment::Error::from(message)));

        if self.service.name.trim().is_empty() {
            return invalid("service.name must not be empty".to_string());
        }
        if self.service.port == 0 {
            return invalid("service.port must be greater than 0".to_string());
        }
        if !LOG_LEVELS.contains(&self.service.log_level.to_ascii_lowercase().as_str()) {
            return invalid(format!(
                "service.log_level '{}' is not one of {}",
                self.service.log_level,
                LOG_LEVELS.join(", ")
            ));
        }
        if self.service.timeout_secs == 0 {
            return invalid("service.timeout_secs must be greater than 0".to_string());
        }
        if self.store.url.trim().is_empty() {
            return invalid("store.url must not be empty".to_string());
        }
        if self.store.operation_timeout_secs == 0 || self.store.readiness_timeout_secs == 0 {
            return invalid("store timeouts must be greater than 0".to_string());
        }
        if self.middleware.body_limit_mb == 0 {
            return invalid("middleware.body_limit_mb must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load `.env` into the process environment unless running in production
    ///
    /// Returns the path that was loaded, if any.
    pub fn load_dotenv() -> Option<PathBuf> {
        if Self::is_production_env() {
            return None;
        }
        dotenvy::dotenv().ok()
    }

    fn is_production_env() -> bool {
        ENVIRONMENT_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .any(|value| value.eq_ignore_ascii_case("prod"))
    }

    /// Request timeout applied to every HTTP request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "tasky".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                log_format: LogFormat::default(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            middleware: MiddlewareConfig::default(),
            store: StoreConfig::default(),
        }
    }
}
