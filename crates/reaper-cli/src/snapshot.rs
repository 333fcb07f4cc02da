//! Snapshot file I/O.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reaper_core::impls::{ClusterSnapshot, InMemoryClusterStore};

/// Load a snapshot file into an in-memory cluster. A missing file is an error.
pub fn load(path: &Path) -> Result<InMemoryClusterStore> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = parse(&raw).with_context(|| format!("invalid snapshot {}", path.display()))?;
    Ok(InMemoryClusterStore::from_snapshot(snapshot))
}

pub fn parse(raw: &str) -> Result<ClusterSnapshot> {
    Ok(serde_json::from_str(raw)?)
}

/// Write the cluster state back. Goes through a temp file so a crash never
/// leaves a half-written snapshot.
pub async fn save(path: &Path, store: &InMemoryClusterStore) -> Result<()> {
    let snapshot = store.snapshot().await;
    let body = serde_json::to_string_pretty(&snapshot)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace snapshot {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_claims_and_workloads() {
        let snapshot = parse(
            r#"{
                "claims": [
                    {"namespace": "team-a", "name": "data-db-0", "storage_class": "standard",
                     "labels": {"volume-cleaner/notification-count": "2"}}
                ],
                "workloads": [
                    {"namespace": "team-a", "name": "db", "claims": ["data-db-0"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.claims.len(), 1);
        assert_eq!(
            snapshot.claims[0].label("volume-cleaner/notification-count"),
            Some("2")
        );
        assert_eq!(snapshot.workloads[0].claims, vec!["data-db-0".to_string()]);
    }

    #[test]
    fn empty_document_is_an_empty_cluster() {
        let snapshot = parse("{}").unwrap();
        assert!(snapshot.claims.is_empty());
        assert!(snapshot.workloads.is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse("not json").is_err());
    }
}
