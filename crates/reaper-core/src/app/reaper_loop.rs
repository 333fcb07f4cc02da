//! ReaperLoop - reconciliation pass を一定間隔で回す
//!
//! # フロー
//! 1. 起動直後に 1 回 pass を実行
//! 2. 以後 `interval` ごとに pass を実行
//! 3. shutdown が来たら次の tick を待たずに抜ける（実行中の pass は最後まで走らせる）
//!
//! pass が失敗しても（claim の list に失敗した等）ループは止めません。
//! 次の tick でもう一度試します。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::scheduler::ReconcileScheduler;

pub struct ReaperLoop {
    scheduler: Arc<ReconcileScheduler>,
    interval: Duration,
}

impl ReaperLoop {
    pub fn new(scheduler: Arc<ReconcileScheduler>, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
        }
    }

    /// Returns how many passes completed successfully.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0usize;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.scheduler.run_pass().await {
                Ok(_) => completed += 1,
                Err(err) => error!(error = %err, "reconciliation pass failed"),
            }
        }

        info!(passes = completed, "reaper loop stopped");
        completed
    }
}
