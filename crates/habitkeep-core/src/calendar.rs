//! Calendar arithmetic for streaks.
//!
//! A streak is measured in distinct calendar engagements, not in elapsed
//! 24-hour periods: a habit completed yesterday at 12:00 and today at 09:00
//! spans only 21 hours but is a 2-day streak. [`days_between`] uses elapsed
//! whole hours as its primitive and applies two corrections on top.
//!
//! All timestamps carry their own UTC offset and the calendar date of a
//! timestamp is the date in that offset. No timezone conversion happens here.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime};

/// Timestamp as supplied by the caller, offset included.
pub type Timestamp = DateTime<FixedOffset>;

/// Length in calendar days of a streak running from `start` to `end`.
///
/// - Identical timestamps count as a single completion: `1`.
/// - Otherwise `floor(whole_hours / 24) + 1`.
/// - Plus one more day when `end` falls on a different calendar date than
///   `start` and its time of day is earlier than `start`'s (compared as
///   hour, minute, second, then sub-second).
///
/// Returns `1` when `end` precedes `start`.
pub fn days_between(start: Timestamp, end: Timestamp) -> u32 {
    if end <= start {
        return 1;
    }

    let whole_hours = (end - start).num_hours();
    let mut days = whole_hours / 24 + 1;

    // Completion time drifted earlier in the day across the streak.
    if !same_day(start, end) && end.time() < start.time() {
        days += 1;
    }

    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Whether both timestamps fall on the same calendar date.
pub fn same_day(a: Timestamp, b: Timestamp) -> bool {
    a.date_naive() == b.date_naive()
}

/// Midnight at the start of the day before `when`, in `when`'s offset.
///
/// A streak whose end boundary is strictly after this instant is still
/// current: the user may not have completed the habit today yet.
pub fn start_of_previous_day(when: Timestamp) -> Timestamp {
    let yesterday = when - Duration::days(1);
    yesterday - (yesterday.time() - NaiveTime::default())
}
