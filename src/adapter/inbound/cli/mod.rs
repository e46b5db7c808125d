//! CLI module graph.

pub mod check;
pub mod command;
pub mod output;
pub mod run;

use crate::error::Result;
use command::{CheckCommand, Cli, Commands};

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    output::set_json(cli.json);
    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args.config),
        Commands::Check(CheckCommand::Health(args)) => check::execute_health(&args.config),
    }
}
