//! Time-unit conversion and end-time resolution

use std::fmt;

use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Remaining time split into display units. Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemainingTime {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl RemainingTime {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Split a total number of seconds into hours, minutes and seconds
    pub fn from_total_seconds(total: u64) -> Self {
        Self {
            hours: total / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    /// Collapse back into a total number of seconds
    pub fn total_seconds(&self) -> u64 {
        self.hours * SECONDS_PER_HOUR + self.minutes * SECONDS_PER_MINUTE + self.seconds
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// AM/PM marker of a 12-hour clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Convert a 12-hour clock hour (1..=12) into a 24-hour clock hour.
    ///
    /// Hours past 12 are passed through unchecked; `None` only on overflow.
    pub fn to_24_hour(self, hour: u32) -> Option<u32> {
        match (self, hour) {
            (Meridiem::Am, 12) => Some(0),
            (Meridiem::Am, hour) => Some(hour),
            (Meridiem::Pm, 12) => Some(12),
            (Meridiem::Pm, hour) => hour.checked_add(12),
        }
    }
}

/// Combine a time of day with the date of `now`, rolling over to the next
/// calendar day when the result is not strictly after `now`.
///
/// Returns `None` only when the date arithmetic overflows or the time of day
/// cannot be placed on the local calendar at all.
pub fn resolve_end_time<Tz: TimeZone>(now: &DateTime<Tz>, time: NaiveTime) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = localize(&tz, today.and_time(time))?;
    if candidate > *now {
        return Some(candidate.with_timezone(&Utc));
    }

    let tomorrow = today.checked_add_days(Days::new(1))?;
    localize(&tz, tomorrow.and_time(time)).map(|end| end.with_timezone(&Utc))
}

/// Whole seconds left until `target`, floored, or `None` once `target` has
/// been reached.
pub fn seconds_until<Tz: TimeZone>(target: DateTime<Utc>, now: &DateTime<Tz>) -> Option<u64> {
    let diff = target.signed_duration_since(now.with_timezone(&Utc));
    if diff <= chrono::Duration::zero() {
        None
    } else {
        Some(diff.num_seconds().max(0) as u64)
    }
}

fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // Skipped by a DST gap: shift the wall-clock reading forward an hour
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest(),
    }
}
