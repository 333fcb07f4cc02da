//! `reaper` binary entry point.

use anyhow::Result;
use clap::Parser;

use reaper_cli::commands::{reconcile, replay, scan};
use reaper_cli::{Cli, Commands};
use reaper_core::observability::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format.into());

    match &cli.command {
        Commands::Scan(args) => scan::execute(args, &cli).await,
        Commands::Reconcile(args) => reconcile::execute(args, &cli).await,
        Commands::Replay(args) => replay::execute(args, &cli).await,
    }
}
