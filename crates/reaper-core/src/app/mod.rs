//! App - アプリケーション層
//!
//! ports を組み合わせて claim のライフサイクルを回します。
//!
//! # 主要コンポーネント
//! - **staleness**: 経過日数と通知 checkpoint の純粋な判定
//! - **ReconcileScheduler**: 1 回分の reconciliation pass（削除 / 通知 / counter 更新）
//! - **ReaperLoop**: pass を一定間隔で回すループ
//! - **LabelController**: workload の add / delete イベントで tracking label を付け外し
//! - **BootstrapScanner**: 起動時に既存の orphan claim へ label を補う
//! - **ReaperBuilder**: 上記のワイヤリングと起動時検証

pub mod bootstrap;
pub mod builder;
mod call;
pub mod controller;
pub mod reaper_loop;
pub mod scheduler;
pub mod staleness;
pub mod status;

pub use self::bootstrap::BootstrapScanner;
pub use self::builder::{BuildError, Reaper, ReaperBuilder};
pub use self::controller::{EventOutcome, LabelController};
pub use self::reaper_loop::ReaperLoop;
pub use self::scheduler::ReconcileScheduler;
pub use self::staleness::{Staleness, is_stale, should_notify};
pub use self::status::{ClaimOutcome, PassSummary, ScanSummary};
