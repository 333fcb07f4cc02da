//! Workload model and watch events.
//!
//! A watch stream can carry objects other than StatefulSets, so the payload is
//! a variant type. Only `WatchObject::Workload` is acted upon.

use serde::{Deserialize, Serialize};

use super::claim::ClaimKey;

/// A StatefulSet, reduced to what the reaper needs: the claims its volumes
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub namespace: String,
    pub name: String,

    #[serde(default)]
    pub claims: Vec<String>,
}

impl Workload {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            claims: Vec::new(),
        }
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claims.push(claim.into());
        self
    }

    /// Claims referenced by this workload. They live in the workload's namespace.
    pub fn claim_keys(&self) -> impl Iterator<Item = ClaimKey> + '_ {
        self.claims
            .iter()
            .map(|name| ClaimKey::new(self.namespace.clone(), name.clone()))
    }

    pub fn references(&self, key: &ClaimKey) -> bool {
        self.namespace == key.namespace && self.claims.iter().any(|c| c == &key.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WatchObject {
    #[serde(rename = "StatefulSet")]
    Workload(Workload),

    /// Anything else delivered on the same stream.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub event_type: WatchEventType,
    pub object: WatchObject,
}

impl WatchEvent {
    pub fn added(workload: Workload) -> Self {
        Self {
            event_type: WatchEventType::Added,
            object: WatchObject::Workload(workload),
        }
    }

    pub fn deleted(workload: Workload) -> Self {
        Self {
            event_type: WatchEventType::Deleted,
            object: WatchObject::Workload(workload),
        }
    }

    pub fn workload(&self) -> Option<&Workload> {
        match &self.object {
            WatchObject::Workload(workload) => Some(workload),
            WatchObject::Other => None,
        }
    }
}
