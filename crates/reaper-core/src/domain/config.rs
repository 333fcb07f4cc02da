//! Scheduler / controller configuration.
//!
//! Both configs deserialize with defaults so a partial JSON document (or the
//! CLI flags) only needs to name what differs from a stock deployment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::ReaperError;
use super::tracking::{NotificationSchedule, TimeFormat};

pub const DEFAULT_TIME_LABEL: &str = "volume-cleaner/unattached-time";
pub const DEFAULT_NOTIF_LABEL: &str = "volume-cleaner/notification-count";
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 180;
pub const DEFAULT_NOTIF_TIMES: [u32; 6] = [1, 2, 3, 4, 7, 30];
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// The two label keys that make up tracking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingLabels {
    pub time_label: String,
    pub notif_label: String,
    pub time_format: TimeFormat,
}

impl TrackingLabels {
    pub fn validate(&self) -> Result<(), ReaperError> {
        if self.time_label.trim().is_empty() {
            return Err(ReaperError::Config("time label must not be empty".to_string()));
        }
        if self.notif_label.trim().is_empty() {
            return Err(ReaperError::Config(
                "notification label must not be empty".to_string(),
            ));
        }
        if self.time_label == self.notif_label {
            return Err(ReaperError::Config(format!(
                "time label and notification label must differ (both {:?})",
                self.time_label
            )));
        }
        Ok(())
    }
}

impl Default for TrackingLabels {
    fn default() -> Self {
        Self {
            time_label: DEFAULT_TIME_LABEL.to_string(),
            notif_label: DEFAULT_NOTIF_LABEL.to_string(),
            time_format: TimeFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Empty means every namespace.
    pub namespace: String,

    #[serde(flatten)]
    pub labels: TrackingLabels,

    pub grace_period_days: u32,
    pub notif_times: NotificationSchedule,
    pub dry_run: bool,

    /// Upper bound for each store / notifier call made during a pass.
    #[serde(with = "duration_secs")]
    pub call_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            labels: TrackingLabels::default(),
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            notif_times: NotificationSchedule::new(DEFAULT_NOTIF_TIMES),
            dry_run: false,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub namespace: String,

    #[serde(flatten)]
    pub labels: TrackingLabels,

    /// Empty matches claims without a storage class.
    pub storage_class: String,

    /// Upper bound for each store call. Shutdown is observed between events,
    /// so this also bounds how long cancellation can take.
    #[serde(with = "duration_secs")]
    pub call_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            labels: TrackingLabels::default(),
            storage_class: String::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_fills_defaults() {
        let cfg: SchedulerConfig =
            serde_json::from_str(r#"{"namespace":"team-a","grace_period_days":10}"#).unwrap();
        assert_eq!(cfg.namespace, "team-a");
        assert_eq!(cfg.grace_period_days, 10);
        assert_eq!(cfg.labels.time_label, DEFAULT_TIME_LABEL);
        assert_eq!(cfg.notif_times.as_slice(), &[30, 7, 4, 3, 2, 1]);
        assert_eq!(cfg.call_timeout, DEFAULT_CALL_TIMEOUT);
    }

    #[test]
    fn flattened_label_keys_are_top_level() {
        let cfg: ControllerConfig = serde_json::from_str(
            r#"{"time_label":"x/t","notif_label":"x/n","storage_class":"standard"}"#,
        )
        .unwrap();
        assert_eq!(cfg.labels.time_label, "x/t");
        assert_eq!(cfg.labels.notif_label, "x/n");
        assert_eq!(cfg.storage_class, "standard");
        assert_eq!(cfg.call_timeout, DEFAULT_CALL_TIMEOUT);
    }

    #[test]
    fn identical_label_keys_are_rejected() {
        let labels = TrackingLabels {
            time_label: "same".to_string(),
            notif_label: "same".to_string(),
            time_format: TimeFormat::default(),
        };
        assert!(matches!(labels.validate(), Err(ReaperError::Config(_))));
    }
}
