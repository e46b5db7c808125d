//! Handlers for `croupier check`.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::{health_check, HealthStatus};

/// Validate a configuration file.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    match Config::load(config_path.as_ref()) {
        Ok(config) => {
            if output::is_json() {
                output::json_output(json!({
                    "command": "check.config",
                    "status": "valid",
                    "admin_id": config.admin_id,
                }));
            } else {
                output::success("Configuration is valid");
            }
            Ok(())
        }
        Err(e) => {
            if output::is_json() {
                output::json_output(json!({
                    "command": "check.config",
                    "status": "invalid",
                    "error": e.to_string(),
                }));
            } else {
                output::error(&e.to_string());
            }
            Err(e)
        }
    }
}

/// Run readiness checks using configuration.
pub fn execute_health<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    let report = health_check(&config);

    if output::is_json() {
        let checks = report
            .checks()
            .iter()
            .map(|check| {
                let (status, details) = describe(check.status());
                json!({
                    "name": check.name(),
                    "critical": check.critical(),
                    "status": status,
                    "details": details,
                })
            })
            .collect::<Vec<_>>();

        output::json_output(json!({
            "command": "check.health",
            "status": if report.is_healthy() { "healthy" } else { "unhealthy" },
            "checks": checks,
        }));
    } else {
        output::section("Health Check");
        for check in report.checks() {
            let (status, details) = describe(check.status());
            let suffix = if check.critical() { " (critical)" } else { "" };
            output::field(
                &format!("{}{}", check.name(), suffix),
                match details {
                    Some(reason) => format!("{status}: {reason}"),
                    None => status.to_string(),
                },
            );
        }
    }

    if !report.is_healthy() {
        output::error("Health check failed");
        return Err(Error::Connection("health check failed".to_string()));
    }
    output::success("Health check passed");
    Ok(())
}

fn describe(status: &HealthStatus) -> (&'static str, Option<&str>) {
    match status {
        HealthStatus::Healthy => ("healthy", None),
        HealthStatus::Unhealthy(reason) => ("unhealthy", Some(reason.as_str())),
    }
}
