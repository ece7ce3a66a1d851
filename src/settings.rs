// used for layered configuration
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::persist::PersistenceMode;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Runtime settings, layered as defaults, then an optional `langforge.*`
/// file, then `LANGFORGE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// SQLite file; absent means an in-memory database.
    #[serde(default)]
    pub database: Option<String>,
    pub bind_address: String,
    pub log_filter: String,
    pub api_url: String,
    pub request_timeout_ms: u64,
}

impl Settings {
    /// Reads `langforge.{json,toml,yaml,...}` from the working directory if present.
    pub fn load() -> Result<Self> {
        Self::build(File::with_name("langforge").required(false))
    }

    /// Reads the given file, which must exist.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS)?
            .add_source(file)
            .add_source(Environment::with_prefix("LANGFORGE").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        match self.database.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => PersistenceMode::File(path.to_string()),
            _ => PersistenceMode::InMemory,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}
