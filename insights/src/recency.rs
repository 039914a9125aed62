//! Trailing-window recency count

use crate::record::ViolationRecord;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Default trailing window for "recent" records
pub const RECENT_WINDOW_DAYS: u32 = 30;

/// First calendar day inside the trailing window ending at `now`
pub fn window_start(now: DateTime<Utc>, window_days: u32) -> NaiveDate {
    now.date_naive() - Duration::days(i64::from(window_days))
}

/// Count records whose event date is on or after `now - window_days`
///
/// Calendar-day granularity: the time of day of `now` and of the event is
/// ignored. Future-dated events count as recent.
pub fn count_recent<'a>(
    records: impl IntoIterator<Item = &'a ViolationRecord>,
    now: DateTime<Utc>,
    window_days: u32,
) -> usize {
    let start = window_start(now, window_days);
    records
        .into_iter()
        .filter(|r| r.event_date >= start)
        .count()
}
