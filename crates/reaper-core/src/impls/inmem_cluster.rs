//! InMemoryClusterStore - 開発用・テスト用の cluster
//!
//! claim と live な workload を保持し、`ClaimStore` と `WorkloadWatcher` の両方を実装します。
//!
//! # 実装詳細
//! - `tokio::sync::Mutex` で state 全体を保護（ロックを持ったまま await しない）
//! - workload の追加 / 削除は subscriber ごとの unbounded channel にイベントを流す
//! - `Faults` で delete / label 書き込み / watch の失敗を注入できる
//! - `ClusterSnapshot` で JSON との相互変換（CLI が使う）

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use crate::domain::{Claim, ClaimKey, ReaperError, WatchEvent, Workload};
use crate::ports::{ClaimStore, WorkloadEventStream, WorkloadWatcher};

/// Serializable view of the whole in-memory cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub workloads: Vec<Workload>,
}

/// Failure injection switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    pub fail_deletes: bool,
    pub fail_label_writes: bool,
    pub fail_watch: bool,
}

struct Subscriber {
    namespace: String,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct ClusterState {
    claims: BTreeMap<ClaimKey, Claim>,
    workloads: BTreeMap<(String, String), Workload>,
    subscribers: Vec<Subscriber>,
    faults: Faults,
}

impl ClusterState {
    fn claim_mut(&mut self, namespace: &str, name: &str) -> Result<&mut Claim, ReaperError> {
        self.claims
            .get_mut(&ClaimKey::new(namespace, name))
            .ok_or_else(|| ReaperError::claim_not_found(namespace, name))
    }

    fn check_label_write(&self) -> Result<(), ReaperError> {
        if self.faults.fail_label_writes {
            return Err(ReaperError::Transport("injected label write failure".to_string()));
        }
        Ok(())
    }

    fn broadcast(&mut self, event: &WatchEvent, namespace: &str) {
        self.subscribers.retain(|sub| {
            if !in_namespace(&sub.namespace, namespace) {
                return !sub.tx.is_closed();
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }

    fn is_attached(&self, key: &ClaimKey) -> bool {
        self.workloads.values().any(|w| w.references(key))
    }
}

fn in_namespace(filter: &str, namespace: &str) -> bool {
    filter.is_empty() || filter == namespace
}

pub struct InMemoryClusterStore {
    state: Mutex<ClusterState>,
}

impl InMemoryClusterStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClusterState::default()),
        }
    }

    /// Load claims and workloads without emitting watch events.
    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        let mut state = ClusterState::default();
        for claim in snapshot.claims {
            state.claims.insert(claim.key(), claim);
        }
        for workload in snapshot.workloads {
            state
                .workloads
                .insert((workload.namespace.clone(), workload.name.clone()), workload);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub async fn snapshot(&self) -> ClusterSnapshot {
        let state = self.state.lock().await;
        ClusterSnapshot {
            claims: state.claims.values().cloned().collect(),
            workloads: state.workloads.values().cloned().collect(),
        }
    }

    pub async fn insert_claim(&self, claim: Claim) {
        let mut state = self.state.lock().await;
        state.claims.insert(claim.key(), claim);
    }

    pub async fn claim(&self, namespace: &str, name: &str) -> Option<Claim> {
        let state = self.state.lock().await;
        state.claims.get(&ClaimKey::new(namespace, name)).cloned()
    }

    pub async fn set_faults(&self, faults: Faults) {
        self.state.lock().await.faults = faults;
    }

    /// Create (or replace) a workload and emit an `ADDED` event.
    pub async fn apply_workload(&self, workload: Workload) {
        let mut state = self.state.lock().await;
        let event = WatchEvent::added(workload.clone());
        let namespace = workload.namespace.clone();
        state
            .workloads
            .insert((workload.namespace.clone(), workload.name.clone()), workload);
        state.broadcast(&event, &namespace);
    }

    /// Remove a workload and emit a `DELETED` event. Returns false if absent.
    pub async fn delete_workload(&self, namespace: &str, name: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(workload) = state
            .workloads
            .remove(&(namespace.to_string(), name.to_string()))
        else {
            return false;
        };
        state.broadcast(&WatchEvent::deleted(workload), namespace);
        true
    }

    /// Push an arbitrary event to subscribers without touching state.
    pub async fn emit(&self, event: WatchEvent, namespace: &str) {
        self.state.lock().await.broadcast(&event, namespace);
    }
}

impl Default for InMemoryClusterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClusterStore {
    async fn list_claims(&self, namespace: &str) -> Result<Vec<Claim>, ReaperError> {
        let state = self.state.lock().await;
        Ok(state
            .claims
            .values()
            .filter(|c| in_namespace(namespace, &c.namespace))
            .cloned()
            .collect())
    }

    async fn get_claim(&self, namespace: &str, name: &str) -> Result<Claim, ReaperError> {
        let state = self.state.lock().await;
        state
            .claims
            .get(&ClaimKey::new(namespace, name))
            .cloned()
            .ok_or_else(|| ReaperError::claim_not_found(namespace, name))
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), ReaperError> {
        let mut state = self.state.lock().await;
        if state.faults.fail_deletes {
            return Err(ReaperError::Transport("injected delete failure".to_string()));
        }
        state
            .claims
            .remove(&ClaimKey::new(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ReaperError::claim_not_found(namespace, name))
    }

    async fn set_claim_label(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ReaperError> {
        let mut state = self.state.lock().await;
        state.check_label_write()?;
        state
            .claim_mut(namespace, name)?
            .labels
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_claim_label(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<(), ReaperError> {
        let mut state = self.state.lock().await;
        state.check_label_write()?;
        state.claim_mut(namespace, name)?.labels.remove(key);
        Ok(())
    }

    async fn list_unattached_claims(
        &self,
        namespace: &str,
        storage_class: &str,
    ) -> Result<Vec<Claim>, ReaperError> {
        let state = self.state.lock().await;
        Ok(state
            .claims
            .values()
            .filter(|c| in_namespace(namespace, &c.namespace))
            .filter(|c| c.matches_storage_class(storage_class))
            .filter(|c| !state.is_attached(&c.key()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WorkloadWatcher for InMemoryClusterStore {
    async fn watch_workloads(&self, namespace: &str) -> Result<WorkloadEventStream, ReaperError> {
        let mut state = self.state.lock().await;
        if state.faults.fail_watch {
            return Err(ReaperError::Watch("injected watch failure".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.push(Subscriber {
            namespace: namespace.to_string(),
            tx,
        });

        let events = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(ns: &str, name: &str) -> Claim {
        Claim::new(ns, name).with_storage_class("standard")
    }

    #[tokio::test]
    async fn unattached_excludes_referenced_claims() {
        let store = InMemoryClusterStore::new();
        store.insert_claim(claim("a", "used")).await;
        store.insert_claim(claim("a", "free")).await;
        store.insert_claim(Claim::new("a", "no-class")).await;
        store
            .apply_workload(Workload::new("a", "db").with_claim("used"))
            .await;

        let free = store.list_unattached_claims("a", "standard").await.unwrap();
        let names: Vec<_> = free.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["free"]);
    }

    #[tokio::test]
    async fn label_write_on_missing_claim_is_not_found() {
        let store = InMemoryClusterStore::new();
        let err = store.set_claim_label("a", "gone", "k", "v").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_namespace_lists_everything() {
        let store = InMemoryClusterStore::new();
        store.insert_claim(claim("a", "one")).await;
        store.insert_claim(claim("b", "two")).await;
        assert_eq!(store.list_claims("").await.unwrap().len(), 2);
        assert_eq!(store.list_claims("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn watch_receives_namespaced_events() {
        let store = InMemoryClusterStore::new();
        let mut events = store.watch_workloads("a").await.unwrap();

        store.apply_workload(Workload::new("b", "other")).await;
        store.apply_workload(Workload::new("a", "db")).await;
        assert!(store.delete_workload("a", "db").await);

        let first = events.next().await.unwrap();
        assert_eq!(first, WatchEvent::added(Workload::new("a", "db")));
        let second = events.next().await.unwrap();
        assert_eq!(second, WatchEvent::deleted(Workload::new("a", "db")));
    }

    #[tokio::test]
    async fn injected_faults_surface_as_errors() {
        let store = InMemoryClusterStore::new();
        store.insert_claim(claim("a", "c")).await;
        store
            .set_faults(Faults {
                fail_deletes: true,
                fail_label_writes: true,
                fail_watch: true,
            })
            .await;

        assert!(matches!(
            store.delete_claim("a", "c").await,
            Err(ReaperError::Transport(_))
        ));
        assert!(matches!(
            store.set_claim_label("a", "c", "k", "v").await,
            Err(ReaperError::Transport(_))
        ));
        assert!(matches!(
            store.watch_workloads("a").await,
            Err(ReaperError::Watch(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_round_trip_keeps_state() {
        let store = InMemoryClusterStore::new();
        store.insert_claim(claim("a", "c").with_label("k", "v")).await;
        store.apply_workload(Workload::new("a", "db").with_claim("c")).await;

        let restored = InMemoryClusterStore::from_snapshot(store.snapshot().await);
        assert_eq!(restored.snapshot().await, store.snapshot().await);
    }
}
