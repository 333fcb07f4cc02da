//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryClusterStore**: 開発用・テスト用の cluster（ClaimStore + WorkloadWatcher）
//! - **LogNotifier** / **RecordingNotifier**: ログ出力 / 記録のみの通知
//! - **HttpNotifier**: email API への通知（reqwest）
//!
//! 実 cluster（Kubernetes API）向けの adapter は別クレートに置く想定です。

pub mod http_notifier;
pub mod inmem_cluster;
pub mod notifiers;

pub use self::http_notifier::{EmailConfig, HttpNotifier};
pub use self::inmem_cluster::{ClusterSnapshot, Faults, InMemoryClusterStore};
pub use self::notifiers::{LogNotifier, RecordingNotifier};
