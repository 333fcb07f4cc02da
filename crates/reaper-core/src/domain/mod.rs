//! Domain model (claims, workloads, tracking labels, config, errors).
//!
//! ここには副作用のない型だけを置きます。cluster や通知への I/O は `ports` 経由。

pub mod claim;
pub mod config;
pub mod errors;
pub mod ids;
pub mod tracking;
pub mod workload;

pub use claim::{Claim, ClaimKey};
pub use config::{ControllerConfig, SchedulerConfig, TrackingLabels};
pub use errors::ReaperError;
pub use ids::PassId;
pub use tracking::{NotificationSchedule, TimeFormat};
pub use workload::{WatchEvent, WatchEventType, WatchObject, Workload};
