//! # configs
//!
//! Layered application configuration: built-in defaults, then an optional
//! `marginalia.toml`, then `MARGINALIA__SECTION__KEY` environment variables.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_VAR: &str = "MARGINALIA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "marginalia.toml";
const ENV_PREFIX: &str = "MARGINALIA";

/// `database.url` value selecting the in-memory stores.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub content: ContentConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {e}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: SecretString,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.expose_secret() == MEMORY_DATABASE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub essays_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_hours: u32,
    pub cookie_name: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    /// Loads `.env`, then the file named by `MARGINALIA_CONFIG` (or
    /// `marginalia.toml`, if present), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_sources(Some(&path), None)
    }

    /// Builds the configuration from an optional file and an explicit
    /// environment map (`None` reads the process environment).
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.static_dir", "static")?
            .set_default("database.url", "sqlite:marginalia.db")?
            .set_default("content.essays_dir", "content/essays")?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("auth.cookie_name", "marginalia_session")?
            .set_default("auth.secure_cookies", false)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.auth.session_ttl_hours == 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        if self.auth.cookie_name.is_empty()
            || !self.auth.cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid(format!(
                "auth.cookie_name {:?} is not a valid cookie name",
                self.auth.cookie_name
            )));
        }
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must be set".into()));
        }
        Ok(())
    }
}
