//! # reaper-cli
//!
//! Command-line front end for the orphaned-claim reaper. Every command works
//! against a cluster snapshot file (JSON, see `ClusterSnapshot`) so the reaper
//! can be driven without a live cluster.
//!
//! ## Commands
//!
//! - `reaper scan` - label unattached claims that are not tracked yet
//! - `reaper reconcile` - run one reconciliation pass, or loop with `--interval-secs`
//! - `reaper replay` - feed recorded watch events (JSON lines) through the label controller
//!
//! ## Configuration
//!
//! - `REAPER_SNAPSHOT` - snapshot path
//! - `REAPER_NAMESPACE` - namespace to act on (empty means all)
//! - `REAPER_LOG_FORMAT` - `pretty` or `json`
//! - `RUST_LOG` - log filter

#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]

pub mod commands;
pub mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reaper_core::domain::{TimeFormat, TrackingLabels};
use reaper_core::domain::config::{DEFAULT_NOTIF_LABEL, DEFAULT_TIME_LABEL};
use reaper_core::domain::tracking::DEFAULT_TIME_FORMAT;
use reaper_core::observability::LogFormat;

/// Orphaned PersistentVolumeClaim reaper.
#[derive(Debug, Parser)]
#[command(name = "reaper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cluster snapshot to read and write back.
    #[arg(long, env = "REAPER_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Namespace to act on. Empty means every namespace.
    #[arg(long, env = "REAPER_NAMESPACE", default_value = "")]
    pub namespace: String,

    /// Label holding the time a claim became unattached.
    #[arg(long, env = "REAPER_TIME_LABEL", default_value = DEFAULT_TIME_LABEL)]
    pub time_label: String,

    /// Label holding how many notifications were sent.
    #[arg(long, env = "REAPER_NOTIF_LABEL", default_value = DEFAULT_NOTIF_LABEL)]
    pub notif_label: String,

    /// strftime pattern of the time label.
    #[arg(long, env = "REAPER_TIME_FORMAT", default_value = DEFAULT_TIME_FORMAT)]
    pub time_format: String,

    /// Log output.
    #[arg(long, env = "REAPER_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Result output.
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn labels(&self) -> TrackingLabels {
        TrackingLabels {
            time_label: self.time_label.clone(),
            notif_label: self.notif_label.clone(),
            time_format: TimeFormat::new(self.time_format.clone()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Label unattached claims that carry no tracking labels yet.
    Scan(commands::scan::ScanArgs),
    /// Delete claims past their grace period and send due notifications.
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Apply recorded watch events through the label controller.
    Replay(commands::replay::ReplayArgs),
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormatArg {
    #[default]
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_build_tracking_labels() {
        let cli = Cli::parse_from([
            "reaper",
            "--snapshot",
            "cluster.json",
            "--namespace",
            "team-a",
            "--time-label",
            "x/since",
            "scan",
        ]);

        let labels = cli.labels();
        assert_eq!(cli.namespace, "team-a");
        assert_eq!(labels.time_label, "x/since");
        assert_eq!(labels.notif_label, DEFAULT_NOTIF_LABEL);
        assert!(matches!(cli.command, Commands::Scan(_)));
    }

    #[test]
    fn snapshot_is_required() {
        let result = Cli::try_parse_from(["reaper", "scan"]);
        assert!(result.is_err());
    }
}
