//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」です。cluster API・通知・時計はすべて
//! ここの trait 越しに使い、app 層は具体的な実装を知りません。
//!
//! - **ClaimStore**: claim の list / get / delete と label の set / remove
//! - **WorkloadWatcher**: StatefulSet の add / delete イベント stream
//! - **Notifier**: 削除前通知の送信
//! - **Clock** / **IdGenerator**: テストで差し替えるための抽象

pub mod claim_store;
pub mod clock;
pub mod id_generator;
pub mod notifier;
pub mod workload_watch;

pub use self::claim_store::ClaimStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::{Notice, Notifier};
pub use self::workload_watch::{WorkloadEventStream, WorkloadWatcher};
