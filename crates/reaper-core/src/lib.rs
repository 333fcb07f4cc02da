//! reaper-core
//!
//! StatefulSet が消えて orphan になった PVC を追跡し、猶予期間が過ぎたら削除する
//! ライフサイクル管理の中核です。削除までの間、持ち主に段階的に通知します。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（claim, workload, tracking label, config, errors, ids）
//! - **ports**: 抽象化レイヤー（ClaimStore, WorkloadWatcher, Notifier, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（staleness, scheduler, controller, bootstrap, loop, builder）
//! - **impls**: ports の実装（InMemoryClusterStore, notifiers）
//! - **observability**: tracing の初期化
//!
//! # ライフサイクル
//! ```text
//! attached ──(workload deleted)──▶ tracked(count=0) ──(checkpoint due)──▶ tracked(count=n)
//!    ▲                                  │                                    │
//!    └────────(workload added)──────────┴──────────(grace period over)──────▶ deleted
//! ```

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
