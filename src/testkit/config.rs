//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::settings::Config;

/// An in-memory, server-less config for `admin`.
pub fn config(admin: &str) -> Config {
    let mut config = Config {
        admin_id: admin.to_string(),
        database: ":memory:".to_string(),
        ..Config::default()
    };
    config.server.enabled = false;
    config
}
