//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the administrator id may be
//! supplied through `CROUPIER_ADMIN_ID` instead, which wins over the file.
//!
//! # Example
//!
//! ```no_run
//! use croupier::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::service::{
    MonitorConfig, PresenceConfig, ReconciliationConfig, ServerConfig, WalletConfig,
};
use crate::domain::AdminId;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `admin_id`.
pub const ADMIN_ID_ENV: &str = "CROUPIER_ADMIN_ID";

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identity of this administrator process in leader election.
    #[serde(default)]
    pub admin_id: String,

    /// Path to SQLite database file.
    ///
    /// Defaults to "croupier.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub presence: PresenceConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_database_path() -> String {
    "croupier.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_id: String::new(),
            database: default_database_path(),
            logging: LoggingConfig::default(),
            presence: PresenceConfig::default(),
            monitor: MonitorConfig::default(),
            reconciliation: ReconciliationConfig::default(),
            wallet: WalletConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content, applying `CROUPIER_ADMIN_ID`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_admin(content, std::env::var(ADMIN_ID_ENV).ok())
    }

    /// Parse configuration with an explicit administrator id override.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_admin(content: &str, admin_override: Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        if let Some(admin) = admin_override.filter(|a| !a.trim().is_empty()) {
            config.admin_id = admin;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[must_use]
    pub fn admin(&self) -> AdminId {
        AdminId::new(self.admin_id.trim())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.admin_id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "admin_id" }.into());
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }

        let presence = &self.presence;
        if presence.heartbeat_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "presence.heartbeat_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if presence.ttl_ms <= presence.heartbeat_ms {
            return Err(ConfigError::InvalidValue {
                field: "presence.ttl_ms",
                reason: "must be greater than heartbeat_ms".to_string(),
            }
            .into());
        }

        let monitor = &self.monitor;
        if monitor.tick_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.tick_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if monitor.recent_bet_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.recent_bet_window_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if monitor.pause_after_secs <= monitor.recent_bet_window_secs {
            return Err(ConfigError::InvalidValue {
                field: "monitor.pause_after_secs",
                reason: "must be greater than recent_bet_window_secs".to_string(),
            }
            .into());
        }

        if self.reconciliation.max_hops == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconciliation.max_hops",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if self.wallet.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wallet.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.wallet.endpoints()?;

        if self.server.enabled {
            self.server.addr()?;
        }

        Ok(())
    }
}
