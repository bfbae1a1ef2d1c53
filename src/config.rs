//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

use crate::error::{Result, ServiceError};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Absolute base URL used to build `Location` headers
    /// (e.g. `https://accounts.example.com`). Derived from the request
    /// `Host` header when unset.
    #[serde(default)]
    pub public_url: Option<String>,

    // === Persistence ===
    /// SQLite database URL (e.g. `sqlite:accounts.db`). The in-memory
    /// store is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_url: None,
            database_url: None,
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("sqlite:") {
                return Err("DATABASE_URL must be a sqlite: URL".to_string());
            }
        }

        if let Some(url) = &self.public_url {
            let parsed = Url::parse(url).map_err(|e| format!("PUBLIC_URL is invalid: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
                return Err("PUBLIC_URL must be an absolute http(s) URL".to_string());
            }
        }

        Ok(())
    }

    /// Parsed `public_url`, if configured.
    pub fn public_base_url(&self) -> Result<Option<Url>> {
        self.public_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidConfig(format!("PUBLIC_URL is invalid: {e}")))
    }

    /// Human-readable name of the configured store backend.
    pub fn store_kind(&self) -> &'static str {
        if self.database_url.is_some() {
            "sqlite"
        } else {
            "memory"
        }
    }
}
