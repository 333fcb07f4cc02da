//! ReconcileScheduler - level-triggered reconciliation pass
//!
//! # フロー（claim ごと、list 順に逐次）
//! 1. time label がなければ skip（controller が付けていない = attach 中）
//! 2. timestamp を parse、失敗したらエラーとして数えて skip
//! 3. stale なら削除（dry run ならログのみ）
//! 4. stale でなければ notification label を読み、checkpoint が来ていれば通知
//!    - 送信に成功したときだけ counter を +1 する
//!    - 失敗したら counter はそのまま = 次の pass で同じ checkpoint を再送
//!
//! pass の中でリトライも並列化もしません。label の書き込みは compare-and-swap なし。
//!
//! counter の書き戻しは判定後の best-effort です。判定と書き込みの間に controller が
//! label を外していた場合、この書き込みで label が復活します（既知の競合）。

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, info, info_span, warn};

use super::call::bounded;
use super::staleness::Staleness;
use super::status::{ClaimOutcome, PassSummary};
use crate::domain::tracking::{format_notif_count, parse_notif_count};
use crate::domain::{Claim, ReaperError, SchedulerConfig};
use crate::ports::{ClaimStore, Clock, IdGenerator, Notice, Notifier};

pub struct ReconcileScheduler {
    store: Arc<dyn ClaimStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: SchedulerConfig,
}

impl ReconcileScheduler {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            ids,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run one pass over every claim in the configured namespace.
    ///
    /// Only a failure to list claims aborts the pass. Per-claim failures are
    /// logged and counted in the returned summary.
    pub async fn run_pass(&self) -> Result<PassSummary, ReaperError> {
        let pass_id = self.ids.generate_pass_id();
        let span = info_span!(
            "reconcile_pass",
            pass_id = %pass_id,
            namespace = %self.config.namespace,
            dry_run = self.config.dry_run,
        );

        async move {
            let now = self.clock.now();
            let claims = self
                .bounded("list claims", self.store.list_claims(&self.config.namespace))
                .await?;
            info!(claims = claims.len(), "starting reconciliation pass");

            let mut summary = PassSummary::new(pass_id);
            for claim in &claims {
                let outcome = self.reconcile_claim(claim, now).await;
                if let ClaimOutcome::Failed(err) = &outcome {
                    warn!(claim = %claim.key(), error = %err, "claim skipped");
                }
                summary.record(&outcome);
            }

            info!(
                errors = summary.errors,
                deletions = summary.deletions,
                notifications = summary.notifications,
                "reconciliation pass complete"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    async fn reconcile_claim(&self, claim: &Claim, now: DateTime<Utc>) -> ClaimOutcome {
        let labels = &self.config.labels;

        let Some(timestamp) = claim.label(&labels.time_label) else {
            debug!(claim = %claim.key(), label = %labels.time_label, "not tracked");
            return ClaimOutcome::Untracked;
        };

        let staleness = match Staleness::parse(
            timestamp,
            &labels.time_format,
            self.config.grace_period_days,
            now,
        ) {
            Ok(staleness) => staleness,
            Err(err) => return ClaimOutcome::Failed(err),
        };

        if staleness.is_stale() {
            return self.delete(claim, &staleness).await;
        }

        let Some(raw_count) = claim.label(&labels.notif_label) else {
            return ClaimOutcome::Failed(ReaperError::Parse(format!(
                "label {} missing on tracked claim",
                labels.notif_label
            )));
        };
        let count = match parse_notif_count(raw_count) {
            Ok(count) => count,
            Err(err) => return ClaimOutcome::Failed(err),
        };

        if !staleness.should_notify(&self.config.notif_times, count) {
            debug!(
                claim = %claim.key(),
                days_left = staleness.days_left(),
                count,
                "no notification due"
            );
            return ClaimOutcome::Waiting {
                days_left: staleness.days_left(),
            };
        }

        self.notify(claim, &staleness, count).await
    }

    async fn delete(&self, claim: &Claim, staleness: &Staleness) -> ClaimOutcome {
        if self.config.dry_run {
            info!(
                claim = %claim.key(),
                elapsed_days = staleness.elapsed_days,
                "DRY RUN: would delete claim"
            );
            return ClaimOutcome::Deleted { dry_run: true };
        }

        match self
            .bounded(
                "delete claim",
                self.store.delete_claim(&claim.namespace, &claim.name),
            )
            .await
        {
            Ok(()) => {
                info!(
                    claim = %claim.key(),
                    elapsed_days = staleness.elapsed_days,
                    "claim deleted"
                );
                ClaimOutcome::Deleted { dry_run: false }
            }
            Err(err) => ClaimOutcome::Failed(err),
        }
    }

    async fn notify(&self, claim: &Claim, staleness: &Staleness, count: usize) -> ClaimOutcome {
        let notice = Notice {
            claim: claim.key(),
            checkpoint: count,
            days_left: staleness.days_left(),
            grace_period_days: staleness.grace_period_days,
            orphaned_at: staleness.orphaned_at,
            delete_after: staleness.delete_after(),
        };

        if self.config.dry_run {
            info!(
                claim = %notice.claim,
                checkpoint = count,
                days_left = notice.days_left,
                "DRY RUN: would notify owner"
            );
            return ClaimOutcome::Notified {
                dry_run: true,
                counter_written: false,
            };
        }

        if let Err(err) = self.bounded("send notification", self.notifier.send(&notice)).await {
            return ClaimOutcome::Failed(err);
        }
        info!(
            claim = %notice.claim,
            checkpoint = count,
            days_left = notice.days_left,
            "owner notified"
        );

        let next = format_notif_count(count + 1);
        let written = self
            .bounded(
                "write notification count",
                self.store.set_claim_label(
                    &claim.namespace,
                    &claim.name,
                    &self.config.labels.notif_label,
                    &next,
                ),
            )
            .await;
        if let Err(err) = &written {
            warn!(
                claim = %notice.claim,
                error = %err,
                "notification sent but count not written; checkpoint will repeat"
            );
        }

        ClaimOutcome::Notified {
            dry_run: false,
            counter_written: written.is_ok(),
        }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, ReaperError>>,
    ) -> Result<T, ReaperError> {
        bounded(op, self.config.call_timeout, call).await
    }
}
