//! Cache staleness policy.
//!
//! A record is valid while `now < timestamp + N calendar days`. The day
//! addition is done on the local calendar, so a record written at 09:00
//! expires at 09:00 local time N days later even across a DST switch.
//!
//! When the expiry wall time occurs twice (clocks set back) the earlier
//! instant is used. When it is skipped (clocks set forward) the record
//! expires at the first wall time that exists after the skipped range.

use chrono::{DateTime, Days, Duration, Local, NaiveDateTime, TimeZone, Timelike, Utc};

/// Default maximum cache age.
pub const DEFAULT_MAX_CACHE_AGE_DAYS: u64 = 7;

/// Longest stretch of skipped wall time searched when resolving an expiry.
const MAX_SKIPPED_MINUTES: i64 = 25 * 60;

/// Decides whether a cached record is still fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_age_days: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { max_age_days: DEFAULT_MAX_CACHE_AGE_DAYS }
    }
}

impl CachePolicy {
    pub fn new(max_age_days: u64) -> Self {
        Self { max_age_days }
    }

    pub fn max_age_days(&self) -> u64 {
        self.max_age_days
    }

    /// Validate `timestamp` against `now` on the local calendar.
    pub fn validate(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.validate_in(&Local, timestamp, now)
    }

    /// Validate on the calendar of `tz`.
    ///
    /// Returns false when the expiry date cannot be represented.
    pub fn validate_in<Tz: TimeZone>(&self, tz: &Tz, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.expiry_in(tz, timestamp) {
            Some(expiry) => now < expiry,
            None => false,
        }
    }

    /// Instant at which a record written at `timestamp` goes stale.
    pub fn expiry_in<Tz: TimeZone>(&self, tz: &Tz, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let wall = timestamp
            .with_timezone(tz)
            .naive_local()
            .checked_add_days(Days::new(self.max_age_days))?;

        resolve_wall_time(tz, wall).map(|expiry| expiry.with_timezone(&Utc))
    }
}

fn resolve_wall_time<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> Option<DateTime<Tz>> {
    if let Some(instant) = tz.from_local_datetime(&wall).earliest() {
        return Some(instant);
    }

    // skipped by a forward transition; transitions fall on whole minutes
    let minute = wall.with_second(0)?.with_nanosecond(0)?;
    (1..=MAX_SKIPPED_MINUTES).find_map(|step| {
        let candidate = minute.checked_add_signed(Duration::minutes(step))?;
        tz.from_local_datetime(&candidate).earliest()
    })
}
