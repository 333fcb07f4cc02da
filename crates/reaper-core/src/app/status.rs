//! Status - pass ごとの集計
//!
//! エラー数・削除数・通知数は process 全体の global ではなく、
//! pass の戻り値として呼び出し側に返します。pass をまたいで保持する状態はありません。

use serde::{Deserialize, Serialize};

use crate::domain::PassId;

/// What happened to one claim during a reconciliation pass.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// No time label: not tracked, not our concern.
    Untracked,
    /// Grace period not over and no checkpoint due.
    Waiting { days_left: i64 },
    Deleted { dry_run: bool },
    /// The notification went out (or was only logged under dry run).
    /// `counter_written` is false when the follow-up label write failed or,
    /// under dry run, was skipped.
    Notified { dry_run: bool, counter_written: bool },
    Failed(crate::domain::ReaperError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub pass_id: PassId,
    pub claims_seen: usize,
    pub untracked: usize,
    pub errors: usize,
    pub deletions: usize,
    pub notifications: usize,
}

impl PassSummary {
    pub fn new(pass_id: PassId) -> Self {
        Self {
            pass_id,
            claims_seen: 0,
            untracked: 0,
            errors: 0,
            deletions: 0,
            notifications: 0,
        }
    }

    pub fn record(&mut self, outcome: &ClaimOutcome) {
        self.claims_seen += 1;
        match outcome {
            ClaimOutcome::Untracked => self.untracked += 1,
            ClaimOutcome::Waiting { .. } => {}
            ClaimOutcome::Deleted { .. } => self.deletions += 1,
            ClaimOutcome::Notified {
                dry_run,
                counter_written,
            } => {
                self.notifications += 1;
                if !dry_run && !counter_written {
                    self.errors += 1;
                }
            }
            ClaimOutcome::Failed(_) => self.errors += 1,
        }
    }
}

/// Result of a bootstrap scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub claims_seen: usize,
    pub labels_written: usize,
    pub errors: usize,
}
