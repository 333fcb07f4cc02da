//! Tracking state encodings.
//!
//! Tracking state lives entirely in two claim labels:
//! - time label: when the claim became orphaned, formatted with [`TimeFormat`]
//! - notification label: base-10 count of notifications already sent
//!
//! These two string encodings are the only persisted layout the reaper owns.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ReaperError;

/// Label values may not contain `:` so the default avoids it.
///
/// Resolution is one second. Two orphan events within the same second write
/// the same timestamp; a later second always writes a strictly greater one.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%SZ";

/// Initial value of the notification label.
pub const INITIAL_NOTIF_COUNT: &str = "0";

/// A `strftime` pattern used for the time label. Parsed values are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeFormat(String);

impl TimeFormat {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn format(&self, at: DateTime<Utc>) -> String {
        at.format(&self.0).to_string()
    }

    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>, ReaperError> {
        NaiveDateTime::parse_from_str(value, &self.0)
            .map(|naive| naive.and_utc())
            .map_err(|e| ReaperError::Parse(format!("timestamp {value:?} ({}): {e}", self.0)))
    }

    /// Checks that formatting and parsing agree (to the second).
    pub fn validate(&self, sample: DateTime<Utc>) -> Result<(), ReaperError> {
        let rendered = self.format(sample);
        let parsed = self.parse(&rendered).map_err(|e| {
            ReaperError::Config(format!("time format {:?} does not round-trip: {e}", self.0))
        })?;
        if parsed.timestamp() != sample.timestamp() {
            return Err(ReaperError::Config(format!(
                "time format {:?} loses precision: {rendered} parsed back as {parsed}",
                self.0
            )));
        }
        Ok(())
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub fn parse_notif_count(value: &str) -> Result<usize, ReaperError> {
    value
        .parse::<usize>()
        .map_err(|e| ReaperError::Parse(format!("notification count {value:?}: {e}")))
}

pub fn format_notif_count(count: usize) -> String {
    count.to_string()
}

/// Descending list of "days before deletion" checkpoints, e.g. `[7, 3, 1]`.
///
/// Construction sorts and de-duplicates so indexing by the notification count
/// always walks the checkpoints from the earliest to the latest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct NotificationSchedule(Vec<u32>);

impl NotificationSchedule {
    pub fn new(days: impl IntoIterator<Item = u32>) -> Self {
        let mut days: Vec<u32> = days.into_iter().collect();
        days.sort_unstable_by(|a, b| b.cmp(a));
        days.dedup();
        Self(days)
    }

    pub fn checkpoint(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for NotificationSchedule {
    fn from(days: Vec<u32>) -> Self {
        Self::new(days)
    }
}

impl From<NotificationSchedule> for Vec<u32> {
    fn from(schedule: NotificationSchedule) -> Self {
        schedule.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_format_round_trips() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap();
        let fmt = TimeFormat::default();
        let rendered = fmt.format(at);
        assert_eq!(rendered, "2024-03-09_17-04-05Z");
        assert_eq!(fmt.parse(&rendered).unwrap(), at);
    }

    #[test]
    fn malformed_timestamp_is_parse_error() {
        let err = TimeFormat::default().parse("yesterday").unwrap_err();
        assert!(matches!(err, ReaperError::Parse(_)));
    }

    #[test]
    fn date_only_format_fails_validation() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap();
        assert!(TimeFormat::new("%Y-%m-%d").validate(at).is_err());
        assert!(TimeFormat::default().validate(at).is_ok());
    }

    #[test]
    fn schedule_is_sorted_descending_and_deduplicated() {
        let schedule = NotificationSchedule::new([1, 7, 3, 7]);
        assert_eq!(schedule.as_slice(), &[7, 3, 1]);
        assert_eq!(schedule.checkpoint(0), Some(7));
        assert_eq!(schedule.checkpoint(3), None);
    }

    #[test]
    fn schedule_deserializes_from_unsorted_list() {
        let schedule: NotificationSchedule = serde_json::from_str("[1, 30, 7]").unwrap();
        assert_eq!(schedule.as_slice(), &[30, 7, 1]);
    }

    #[test]
    fn notif_count_rejects_garbage() {
        assert_eq!(parse_notif_count("2").unwrap(), 2);
        assert!(parse_notif_count("two").is_err());
        assert!(parse_notif_count("-1").is_err());
        assert_eq!(format_notif_count(3), "3");
    }
}
