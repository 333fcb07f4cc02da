//! LabelController - edge-triggered tracking label maintenance
//!
//! # 不変条件
//! 「claim が tracked ⇔ storage class が一致する live な workload のどれからも参照されていない」
//!
//! # イベントごとの処理
//! - **Added**: 参照されている claim から time / notification label を外す
//! - **Deleted**: 参照されていた claim に time = now, notification = "0" を付ける
//! - それ以外（Modified, Bookmark, StatefulSet 以外の object）は無視
//!
//! # キャンセル
//! `watch::Receiver<bool>` が true になるか sender が drop されたら、次のイベントを
//! 待っている途中でも抜けます。キャンセルはイベントの合間でしか観測しないので、
//! 1 イベント分の label 変更が途中で切れることはありません。
//! store 呼び出しはそれぞれ `call_timeout` で打ち切るので、キャンセルまでの待ちは
//! 1 イベント分の呼び出し回数 × `call_timeout` が上限です。

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

use super::call::bounded;
use crate::domain::tracking::INITIAL_NOTIF_COUNT;
use crate::domain::{
    ClaimKey, ControllerConfig, ReaperError, WatchEvent, WatchEventType, WatchObject, Workload,
};
use crate::ports::{ClaimStore, Clock, WorkloadWatcher};

/// Label changes made while handling one workload event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub claims_matched: usize,
    pub labels_written: usize,
    pub labels_removed: usize,
    pub errors: usize,
}

pub struct LabelController {
    store: Arc<dyn ClaimStore>,
    watcher: Arc<dyn WorkloadWatcher>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
}

impl LabelController {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        watcher: Arc<dyn WorkloadWatcher>,
        clock: Arc<dyn Clock>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            watcher,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Watch workloads until `shutdown` fires.
    ///
    /// # Errors
    /// - the watch cannot be established (`ReaperError::Watch` from the port)
    /// - the event stream ends on its own (`ReaperError::WatchClosed`)
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ReaperError> {
        let span = info_span!("label_controller", namespace = %self.config.namespace);

        async move {
            let mut events = bounded(
                "watch workloads",
                self.config.call_timeout,
                self.watcher.watch_workloads(&self.config.namespace),
            )
            .await?;
            info!("watching for workload events");

            loop {
                if *shutdown.borrow() {
                    break;
                }

                let event = tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            // sender dropped
                            break;
                        }
                        continue;
                    }
                    event = events.next() => event,
                };

                let Some(event) = event else {
                    warn!("workload watch stream ended");
                    return Err(ReaperError::WatchClosed);
                };

                self.handle_event(&event).await;
            }

            info!("label controller stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Apply one event. Returns `None` when the event is ignored.
    pub async fn handle_event(&self, event: &WatchEvent) -> Option<EventOutcome> {
        let workload = match &event.object {
            WatchObject::Workload(workload) => workload,
            WatchObject::Other => {
                debug!(
                    error = %ReaperError::MalformedEvent("payload is not a StatefulSet".to_string()),
                    "dropping event"
                );
                return None;
            }
        };

        match event.event_type {
            WatchEventType::Added => Some(self.handle_added(workload).await),
            WatchEventType::Deleted => Some(self.handle_deleted(workload).await),
            WatchEventType::Modified | WatchEventType::Bookmark => None,
        }
    }

    async fn handle_added(&self, workload: &Workload) -> EventOutcome {
        info!(workload = %workload.name, "workload added");
        let labels = &self.config.labels;
        let mut outcome = EventOutcome::default();

        for key in workload.claim_keys() {
            let Some(claim) = self.resolve(&key, &mut outcome).await else {
                continue;
            };

            for label in [&labels.time_label, &labels.notif_label] {
                if !claim.has_label(label) {
                    continue;
                }
                match bounded(
                    "remove label",
                    self.config.call_timeout,
                    self.store.remove_claim_label(&key.namespace, &key.name, label),
                )
                .await
                {
                    Ok(()) => {
                        debug!(claim = %key, label = %label, "label removed");
                        outcome.labels_removed += 1;
                    }
                    Err(err) => {
                        warn!(claim = %key, label = %label, error = %err, "failed to remove label");
                        outcome.errors += 1;
                    }
                }
            }
        }

        outcome
    }

    async fn handle_deleted(&self, workload: &Workload) -> EventOutcome {
        info!(workload = %workload.name, "workload deleted");
        let labels = &self.config.labels;
        let mut outcome = EventOutcome::default();
        let orphaned_at = labels.time_format.format(self.clock.now());

        for key in workload.claim_keys() {
            if self.resolve(&key, &mut outcome).await.is_none() {
                continue;
            }

            let writes = [
                (&labels.time_label, orphaned_at.as_str()),
                (&labels.notif_label, INITIAL_NOTIF_COUNT),
            ];
            for (label, value) in writes {
                match bounded(
                    "set label",
                    self.config.call_timeout,
                    self.store.set_claim_label(&key.namespace, &key.name, label, value),
                )
                .await
                {
                    Ok(()) => {
                        debug!(claim = %key, label = %label, value, "label set");
                        outcome.labels_written += 1;
                    }
                    Err(err) => {
                        warn!(claim = %key, label = %label, error = %err, "failed to set label");
                        outcome.errors += 1;
                    }
                }
            }
        }

        outcome
    }

    /// Fetch a referenced claim and apply the storage-class filter.
    async fn resolve(
        &self,
        key: &ClaimKey,
        outcome: &mut EventOutcome,
    ) -> Option<crate::domain::Claim> {
        let fetch = bounded(
            "get claim",
            self.config.call_timeout,
            self.store.get_claim(&key.namespace, &key.name),
        );
        let claim = match fetch.await {
            Ok(claim) => claim,
            Err(err) => {
                warn!(claim = %key, error = %err, "could not fetch claim");
                outcome.errors += 1;
                return None;
            }
        };

        if !claim.matches_storage_class(&self.config.storage_class) {
            debug!(
                claim = %key,
                storage_class = ?claim.storage_class,
                "storage class does not match filter"
            );
            return None;
        }

        outcome.claims_matched += 1;
        Some(claim)
    }
}
