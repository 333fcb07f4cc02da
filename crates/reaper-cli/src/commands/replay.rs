//! Replay command - drive the label controller from recorded watch events.
//!
//! The events file holds one JSON watch event per line, e.g.
//! `{"type":"DELETED","object":{"kind":"StatefulSet","namespace":"a","name":"db","claims":["data-db-0"]}}`.
//! Workload additions and deletions are applied to the snapshot before the
//! controller sees the event, the same order a live cluster produces them.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::warn;

use reaper_core::app::ReaperBuilder;
use reaper_core::domain::{ControllerConfig, ReaperError, WatchEvent, WatchEventType};

use super::{open_store, report};
use crate::{Cli, snapshot};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON-lines file of watch events.
    #[arg(long)]
    pub events: PathBuf,

    /// Storage class to consider. Empty matches claims without one.
    #[arg(long, env = "REAPER_STORAGE_CLASS", default_value = "")]
    pub storage_class: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub ignored: usize,
    pub malformed: usize,
    pub claims_matched: usize,
    pub labels_written: usize,
    pub labels_removed: usize,
    pub errors: usize,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_event(line: &str) -> Option<Result<WatchEvent, ReaperError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line).map_err(|e| ReaperError::MalformedEvent(e.to_string())))
}

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the snapshot or events file cannot be read, the
/// snapshot cannot be written, or the configuration is invalid.
pub async fn execute(args: &ReplayArgs, cli: &Cli) -> Result<()> {
    let raw = fs::read_to_string(&args.events)
        .with_context(|| format!("failed to read events {}", args.events.display()))?;

    let store = open_store(cli)?;
    let reaper = ReaperBuilder::new(store.clone())
        .watcher(store.clone())
        .with_controller(ControllerConfig {
            namespace: cli.namespace.clone(),
            labels: cli.labels(),
            storage_class: args.storage_class.clone(),
            ..ControllerConfig::default()
        })
        .build()
        .context("invalid replay configuration")?;
    let controller = reaper.controller().context("controller was not built")?;

    let mut summary = ReplaySummary::default();
    for (lineno, line) in raw.lines().enumerate() {
        let event = match parse_event(line) {
            None => continue,
            Some(Ok(event)) => event,
            Some(Err(err)) => {
                warn!(line = lineno + 1, error = %err, "skipping event");
                summary.malformed += 1;
                continue;
            }
        };
        summary.events += 1;

        if let Some(workload) = event.workload() {
            let in_scope = cli.namespace.is_empty() || cli.namespace == workload.namespace;
            match event.event_type {
                WatchEventType::Added if in_scope => store.apply_workload(workload.clone()).await,
                WatchEventType::Deleted if in_scope => {
                    store
                        .delete_workload(&workload.namespace, &workload.name)
                        .await;
                }
                _ => {}
            }
            if !in_scope {
                summary.ignored += 1;
                continue;
            }
        }

        match controller.handle_event(&event).await {
            Some(outcome) => {
                summary.claims_matched += outcome.claims_matched;
                summary.labels_written += outcome.labels_written;
                summary.labels_removed += outcome.labels_removed;
                summary.errors += outcome.errors;
            }
            None => summary.ignored += 1,
        }
    }

    snapshot::save(&cli.snapshot, &store).await?;

    report(
        cli.output,
        &format!(
            "replayed {} events ({} ignored, {} malformed): {} claims matched, {} labels written, {} removed, {} errors",
            summary.events,
            summary.ignored,
            summary.malformed,
            summary.claims_matched,
            summary.labels_written,
            summary.labels_removed,
            summary.errors
        ),
        &summary,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reaper_core::domain::WatchObject;

    #[test]
    fn parses_statefulset_deletion() {
        let event = parse_event(
            r#"{"type":"DELETED","object":{"kind":"StatefulSet","namespace":"a","name":"db","claims":["data-db-0"]}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.event_type, WatchEventType::Deleted);
        assert_eq!(event.workload().unwrap().claims, vec!["data-db-0".to_string()]);
    }

    #[test]
    fn other_kinds_parse_as_other() {
        let event = parse_event(r#"{"type":"ADDED","object":{"kind":"Deployment","name":"web"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.object, WatchObject::Other);
    }

    #[test]
    fn blank_lines_are_skipped_and_garbage_is_malformed() {
        assert!(parse_event("   ").is_none());
        assert!(matches!(
            parse_event("{oops"),
            Some(Err(ReaperError::MalformedEvent(_)))
        ));
    }
}
