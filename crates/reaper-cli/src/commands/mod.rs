//! Subcommand implementations.

pub mod reconcile;
pub mod replay;
pub mod scan;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use reaper_core::impls::InMemoryClusterStore;

use crate::{Cli, OutputFormat, snapshot};

/// Print a command result in the requested format.
pub(crate) fn report<T: Serialize>(format: OutputFormat, text: &str, value: &T) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

pub(crate) fn open_store(cli: &Cli) -> Result<Arc<InMemoryClusterStore>> {
    Ok(Arc::new(snapshot::load(&cli.snapshot)?))
}
