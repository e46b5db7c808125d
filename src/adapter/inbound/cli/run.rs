//! Handler for the `run` command.

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    config.init_logging();

    if !output::is_json() {
        output::section(concat!("croupier ", env!("CARGO_PKG_VERSION")));
        output::field("Administrator", &config.admin_id);
        output::field("Database", &config.database);
        if config.server.enabled {
            output::field("HTTP API", &config.server.bind);
        }
    }

    orchestration::run(config).await
}

fn load_config(args: &RunArgs) -> Result<Config> {
    let content = std::fs::read_to_string(&args.config).map_err(ConfigError::ReadFile)?;
    let mut config = Config::parse_toml_with_admin(&content, args.admin_id.clone())?;
    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }
    if args.no_server {
        config.server.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            admin_id: None,
            log_level: None,
            json_logs: false,
            no_server: false,
        }
    }

    #[test]
    fn overrides_replace_logging_and_server() {
        let mut config = crate::testkit::config::config("admin-1");
        config.server.enabled = true;
        let args = RunArgs {
            log_level: Some("debug".to_string()),
            json_logs: true,
            no_server: true,
            ..args()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(!config.server.enabled);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let args = RunArgs {
            config: PathBuf::from("/nonexistent/croupier.toml"),
            ..args()
        };

        let err = load_config(&args).unwrap_err();

        assert!(err.to_string().contains("failed to read config file"));
    }
}
