//! Staleness evaluator: pure decisions over a claim's tracking timestamp.
//!
//! Nothing here touches the cluster. Given the orphan timestamp, the grace
//! period, the notification schedule and the current count, it answers two
//! questions: is the claim stale, and is a notification checkpoint due.
//!
//! The notification count indexes the descending schedule instead of being
//! derived from elapsed time. A pass that runs after downtime therefore fires
//! the oldest unsent checkpoint first, and the next pass fires the one after
//! it, until every checkpoint that came due has been sent exactly once.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{NotificationSchedule, ReaperError, TimeFormat};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days elapsed, `floor(hours / 24)`.
pub fn elapsed_days(orphaned_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - orphaned_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Staleness of one claim at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staleness {
    pub orphaned_at: DateTime<Utc>,
    pub elapsed_days: i64,
    pub grace_period_days: u32,
}

impl Staleness {
    pub fn at(orphaned_at: DateTime<Utc>, grace_period_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            orphaned_at,
            elapsed_days: elapsed_days(orphaned_at, now),
            grace_period_days,
        }
    }

    pub fn parse(
        timestamp: &str,
        format: &TimeFormat,
        grace_period_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ReaperError> {
        Ok(Self::at(format.parse(timestamp)?, grace_period_days, now))
    }

    /// `elapsed_days == grace_period_days` is not stale yet.
    pub fn is_stale(&self) -> bool {
        self.elapsed_days > i64::from(self.grace_period_days)
    }

    pub fn days_left(&self) -> i64 {
        i64::from(self.grace_period_days) - self.elapsed_days
    }

    /// First instant at which `is_stale` turns true.
    pub fn delete_after(&self) -> DateTime<Utc> {
        self.orphaned_at + Duration::days(i64::from(self.grace_period_days) + 1)
    }

    pub fn should_notify(&self, schedule: &NotificationSchedule, current_count: usize) -> bool {
        schedule
            .checkpoint(current_count)
            .is_some_and(|days| i64::from(days) >= self.days_left())
    }
}

pub fn is_stale(
    timestamp: &str,
    format: &TimeFormat,
    grace_period_days: u32,
    now: DateTime<Utc>,
) -> Result<bool, ReaperError> {
    Ok(Staleness::parse(timestamp, format, grace_period_days, now)?.is_stale())
}

pub fn should_notify(
    timestamp: &str,
    format: &TimeFormat,
    grace_period_days: u32,
    schedule: &NotificationSchedule,
    current_count: usize,
    now: DateTime<Utc>,
) -> Result<bool, ReaperError> {
    Ok(Staleness::parse(timestamp, format, grace_period_days, now)?
        .should_notify(schedule, current_count))
}
