//! Service configuration for presence, the monitor, reconciliation, the
//! wallet and the HTTP server.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::application::reconcile::resolver::DEFAULT_MAX_HOPS;
use crate::application::session::MachineConfig;
use crate::domain::ProviderType;
use crate::error::{ConfigError, Result};

/// Session monitor timing.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between passes while leader (default: 30).
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// A bet this recent activates a ready or paused session (default: 30).
    #[serde(default = "default_recent_bet_window_secs")]
    pub recent_bet_window_secs: u64,
    /// Idle seconds after the last bet before pausing (default: 240).
    #[serde(default = "default_pause_after_secs")]
    pub pause_after_secs: u64,
}

const fn default_tick_secs() -> u64 {
    30
}

const fn default_recent_bet_window_secs() -> u64 {
    30
}

const fn default_pause_after_secs() -> u64 {
    240
}

impl MonitorConfig {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    #[must_use]
    pub fn machine(&self) -> MachineConfig {
        MachineConfig {
            recent_bet_window: secs(self.recent_bet_window_secs),
            pause_after: secs(self.pause_after_secs),
        }
    }
}

fn secs(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            recent_bet_window_secs: default_recent_bet_window_secs(),
            pause_after_secs: default_pause_after_secs(),
        }
    }
}

/// Shared presence heartbeat.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Milliseconds between heartbeats and membership polls (default: 2000).
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    /// A member silent for this many milliseconds is dropped (default: 10000).
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

const fn default_heartbeat_ms() -> u64 {
    2000
}

const fn default_ttl_ms() -> u64 {
    10_000
}

impl PresenceConfig {
    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX))
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: default_heartbeat_ms(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Parent links followed before giving up on a partner chain.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

const fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
        }
    }
}

/// Provider wallet endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Per-request timeout in milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Provider name -> base URL.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

const fn default_timeout_ms() -> u64 {
    5000
}

impl WalletConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed endpoint map.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for unknown providers or
    /// unparseable URLs.
    pub fn endpoints(&self) -> Result<HashMap<ProviderType, Url>> {
        self.endpoints
            .iter()
            .map(|(name, raw)| -> Result<(ProviderType, Url)> {
                let provider =
                    ProviderType::from_str(name).map_err(|e| ConfigError::InvalidValue {
                        field: "wallet.endpoints",
                        reason: e.to_string(),
                    })?;
                let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                    field: "wallet.endpoints",
                    reason: format!("{name}: {e}"),
                })?;
                Ok((provider, url))
            })
            .collect()
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            endpoints: BTreeMap::new(),
        }
    }
}

/// Inbound HTTP API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_enabled() -> bool {
    true
}

impl ServerConfig {
    /// Parsed bind address.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if `bind` is not `host:port`.
    pub fn addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                field: "server.bind",
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enabled: default_enabled(),
        }
    }
}
