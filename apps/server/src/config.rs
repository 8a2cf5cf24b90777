//! Server configuration module.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//! built-in defaults  →  ./caja.toml (optional)  →  CAJA_* environment
//! ```
//!
//! e.g. `CAJA_PORT=9090 CAJA_DATABASE_PATH=/var/lib/caja/caja.db caja-server`

use caja_core::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use caja_db::DbConfig;
use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Name of the optional config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "caja";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Apply embedded migrations on start
    pub run_migrations: bool,

    /// Page size of the closed-register history when the client sends none
    pub history_limit: u32,
}

impl ServerConfig {
    /// Loads defaults, `./caja.toml` if present, then `CAJA_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Same layering, with an explicit (required) config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(File::from(path).required(true))
    }

    fn load_with<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("database_path", "./caja.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("run_migrations", true)?
            .set_default("history_limit", i64::from(DEFAULT_HISTORY_LIMIT))?
            .add_source(file)
            .add_source(Environment::with_prefix("CAJA").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if !(1..=MAX_HISTORY_LIMIT).contains(&self.history_limit) {
            return Err(ConfigError::InvalidValue("history_limit".to_string()));
        }
        self.host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))?;
        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Database settings derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .run_migrations(self.run_migrations)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
