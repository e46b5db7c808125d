use clap::Parser;
use croupier::adapter::inbound::cli::{self, command::Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    cli::execute(cli).await?;
    Ok(())
}
