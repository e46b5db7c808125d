//! Startup health reporting.

use crate::infrastructure::config::settings::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &'static str, critical: bool, failure: Option<String>) -> Self {
        Self {
            name,
            critical,
            status: failure.map_or(HealthStatus::Healthy, HealthStatus::Unhealthy),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    /// Healthy when every critical check passes.
    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }
}

pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck::new(
        "admin_id",
        true,
        config
            .admin_id
            .trim()
            .is_empty()
            .then(|| "admin_id is empty".to_string()),
    ));

    checks.push(HealthCheck::new(
        "database",
        true,
        config
            .database
            .trim()
            .is_empty()
            .then(|| "database path is empty".to_string()),
    ));

    // Sessions still run without a wallet; only reconciliation fails.
    checks.push(HealthCheck::new(
        "wallet_endpoints",
        false,
        match config.wallet.endpoints() {
            Ok(endpoints) if endpoints.is_empty() => {
                Some("no wallet endpoints configured".to_string())
            }
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        },
    ));

    if config.server.enabled {
        checks.push(HealthCheck::new(
            "http_bind",
            true,
            config.server.addr().err().map(|e| e.to_string()),
        ));
    }

    HealthReport { checks }
}
