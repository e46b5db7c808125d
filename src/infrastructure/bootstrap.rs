//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::sqlite::{open, DbPool, SqlitePresence, SqliteStore};
use crate::adapter::outbound::wallet::HttpWalletClient;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};

/// Build notifier registry from configuration.
pub(crate) fn build_notifier_registry(_config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Open the SQLite database and apply pending migrations.
pub(crate) fn init_database(config: &Config) -> Result<DbPool> {
    let pool = open(&config.database)?;
    info!(database = %config.database, "Database initialized");
    Ok(pool)
}

/// Presence shared with every administrator on the same database.
pub(crate) fn build_presence(config: &Config, pool: DbPool) -> Arc<SqlitePresence> {
    info!(
        heartbeat_ms = config.presence.heartbeat_ms,
        ttl_ms = config.presence.ttl_ms,
        "Presence initialized"
    );
    Arc::new(SqlitePresence::new(pool, config.presence.ttl()))
}

/// Build the provider wallet client.
pub(crate) fn build_wallet(config: &Config) -> Result<Arc<HttpWalletClient>> {
    let endpoints = config.wallet.endpoints()?;
    if endpoints.is_empty() {
        warn!("No wallet endpoints configured, every reconciliation will fail");
    }
    Ok(Arc::new(HttpWalletClient::new(
        endpoints,
        config.wallet.timeout(),
    )?))
}
