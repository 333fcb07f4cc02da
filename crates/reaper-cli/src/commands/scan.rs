//! Scan command - track claims that were already unattached at startup.

use anyhow::{Context, Result};
use clap::Args;

use reaper_core::app::ReaperBuilder;
use reaper_core::domain::ControllerConfig;

use super::{open_store, report};
use crate::{Cli, snapshot};

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Storage class to consider. Empty matches claims without one.
    #[arg(long, env = "REAPER_STORAGE_CLASS", default_value = "")]
    pub storage_class: String,
}

impl ScanArgs {
    pub fn config(&self, cli: &Cli) -> ControllerConfig {
        ControllerConfig {
            namespace: cli.namespace.clone(),
            labels: cli.labels(),
            storage_class: self.storage_class.clone(),
            ..ControllerConfig::default()
        }
    }
}

/// Execute the scan command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or written, the label
/// configuration is invalid, or listing claims fails.
pub async fn execute(args: &ScanArgs, cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let reaper = ReaperBuilder::new(store.clone())
        .watcher(store.clone())
        .with_controller(args.config(cli))
        .build()
        .context("invalid scan configuration")?;
    let bootstrap = reaper
        .bootstrap()
        .context("bootstrap scanner was not built")?;

    let summary = bootstrap.scan().await?;
    snapshot::save(&cli.snapshot, &store).await?;

    report(
        cli.output,
        &format!(
            "scanned {} unattached claims, wrote {} labels, {} errors",
            summary.claims_seen, summary.labels_written, summary.errors
        ),
        &summary,
    )
}
