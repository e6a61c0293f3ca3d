use chrono::{DateTime, Utc};

/// Source of "now" for services whose rules depend on elapsed time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen clock for demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole calendar days from `now` until `target`, rounded up.
///
/// Past targets yield zero or negative values, so callers can filter on `> 0`.
pub fn days_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    let millis = (target - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

/// Whole days elapsed since `start`, rounded up.
pub fn days_since(now: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    days_until(start, now)
}

/// Human-readable age of `then` relative to `now`, using truncating integer division.
///
/// Future timestamps read as "Just now".
pub fn time_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "Just now".to_string();
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if minutes < 60 {
        format!("{minutes} minutes ago")
    } else if hours < 24 {
        format!("{hours} hours ago")
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        format!("{} weeks ago", days / 7)
    }
}
