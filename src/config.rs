// src/config.rs

//! Manages server configuration: loading and validation.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// The server's runtime configuration, loaded from a `config.toml` file (with
/// environment overrides) via the `config` crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    6379
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, layering a `config.toml` file (if
    /// present) over built-in defaults, with environment variables prefixed
    /// `SPINELDB_` taking precedence over both. Missing files fall back to
    /// defaults entirely, so the server runs out of the box with no config
    /// file present.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .set_default("log_level", default_log_level())?
            .set_default("max_clients", default_max_clients() as i64)?
            .add_source(config::File::from(std::path::Path::new(path)).required(false))
            .add_source(config::Environment::with_prefix("SPINELDB"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        Ok(())
    }
}
