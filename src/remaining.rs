//! Time remaining until a target instant.
//!
//! This module holds the pure calculation at the bottom of the crate: given a
//! target and the current instant it produces a [`TimeRemaining`] value. All
//! arithmetic happens on absolute instants, so the result does not depend on
//! any timezone.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_countdown::remaining::calculate_at;
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let remaining = calculate_at(now + Duration::seconds(3725), now).unwrap();
//!
//! assert_eq!(remaining.hours, 1);
//! assert_eq!(remaining.minutes, 2);
//! assert_eq!(remaining.seconds, 5);
//! assert!(!remaining.is_expired);
//! ```
//!
//! Targets may also be given as timestamp strings:
//!
//! ```rust
//! use bubbletea_countdown::remaining::{calculate_at, Target};
//! use chrono::{TimeZone, Utc};
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
//! let remaining = calculate_at("2024-01-01T13:30:00Z", now).unwrap();
//! assert_eq!(remaining.total_seconds, 5400);
//!
//! // Garbage is rejected rather than silently treated as expired.
//! assert!(Target::from("not a date").resolve().is_err());
//! ```

use crate::error::{CountdownError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::time::{Duration, SystemTime};

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Naive layouts accepted after RFC 3339 fails. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// The remaining span between now and a target, decomposed for display.
///
/// `total_seconds` is the source of truth. The `hours`, `minutes` and
/// `seconds` fields are always derived from it, so
/// `hours * 3600 + minutes * 60 + seconds == total_seconds` holds for every
/// value this type can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRemaining {
    /// Whole hours remaining. Unbounded.
    pub hours: u64,
    /// Minutes past the whole hours, in `0..=59`.
    pub minutes: u64,
    /// Seconds past the whole minutes, in `0..=59`.
    pub seconds: u64,
    /// The undecomposed remainder in seconds.
    pub total_seconds: u64,
    /// Whether the countdown has reached zero.
    pub is_expired: bool,
}

impl TimeRemaining {
    /// Decompose a total number of seconds.
    pub fn from_total_seconds(total_seconds: u64) -> Self {
        Self {
            hours: total_seconds / SECONDS_PER_HOUR,
            minutes: (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total_seconds % SECONDS_PER_MINUTE,
            total_seconds,
            is_expired: total_seconds == 0,
        }
    }

    /// The zero value reported for expired countdowns and countdowns without
    /// a target.
    pub fn expired() -> Self {
        Self::from_total_seconds(0)
    }

    /// Remaining time from `now` until `target`, clamped at zero.
    ///
    /// Sub-second remainders are floored, so a countdown with less than one
    /// second left is already expired.
    pub fn between(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = target.signed_duration_since(now).num_milliseconds();
        if millis <= 0 {
            return Self::expired();
        }
        Self::from_total_seconds((millis / 1000) as u64)
    }

    /// The remainder as a standard library duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.total_seconds)
    }
}

impl Default for TimeRemaining {
    fn default() -> Self {
        Self::expired()
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// The instant a countdown runs towards.
///
/// Native instants, epoch milliseconds and timestamp strings are accepted;
/// strings are only parsed when the target is [resolved](Target::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An absolute instant.
    Instant(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// A timestamp string, parsed on resolution.
    Text(String),
}

impl Target {
    /// Resolve the target to an absolute UTC instant.
    ///
    /// Strings are tried, in order, as RFC 3339 (`2024-05-01T10:00:00+02:00`),
    /// a naive date-time taken as UTC (`2024-05-01T08:00:00`,
    /// `2024-05-01 08:00:00.250`) and finally a bare date at UTC midnight
    /// (`2024-05-01`). Bare integers such as `"2025"` are not timestamps;
    /// pass epoch milliseconds as an `i64` instead.
    ///
    /// # Errors
    ///
    /// Returns [`CountdownError::InvalidTarget`] when none of the layouts match
    /// or epoch milliseconds fall outside the representable range.
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        match self {
            Target::Instant(instant) => Ok(*instant),
            Target::EpochMillis(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .ok_or_else(|| CountdownError::invalid_target(millis.to_string())),
            Target::Text(text) => parse_timestamp(text),
        }
    }
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let text = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| CountdownError::invalid_target(input))
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Target {
    fn from(instant: DateTime<Tz>) -> Self {
        Target::Instant(instant.with_timezone(&Utc))
    }
}

impl From<SystemTime> for Target {
    fn from(instant: SystemTime) -> Self {
        Target::Instant(DateTime::<Utc>::from(instant))
    }
}

impl From<i64> for Target {
    fn from(millis: i64) -> Self {
        Target::EpochMillis(millis)
    }
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        Target::Text(text.to_string())
    }
}

impl From<String> for Target {
    fn from(text: String) -> Self {
        Target::Text(text)
    }
}

/// Source of the current instant.
///
/// The countdown component reads time through a clock so it can be driven
/// deterministically; [`SystemClock`] is the default.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Calculates the time remaining from `now` until `target`.
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`] if a string target cannot be
/// parsed.
pub fn calculate_at(target: impl Into<Target>, now: DateTime<Utc>) -> Result<TimeRemaining> {
    let target = target.into().resolve()?;
    Ok(TimeRemaining::between(target, now))
}

/// Calculates the time remaining until `target`, reading the wall clock.
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`] if a string target cannot be
/// parsed.
pub fn calculate(target: impl Into<Target>) -> Result<TimeRemaining> {
    calculate_at(target, Utc::now())
}
