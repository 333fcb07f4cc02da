//! Notifier port - claim の持ち主への通知
//!
//! 宛先の解決とテンプレートの描画は実装側の責務です。
//! core は「どの claim が、あと何日で消えるか」だけを渡します。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClaimKey, ReaperError};

/// One notification checkpoint that came due for a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub claim: ClaimKey,

    /// Index into the notification schedule (equals the count before sending).
    pub checkpoint: usize,

    pub days_left: i64,
    pub grace_period_days: u32,
    pub orphaned_at: DateTime<Utc>,

    /// First instant at which a pass will treat the claim as stale.
    pub delete_after: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), ReaperError>;
}
