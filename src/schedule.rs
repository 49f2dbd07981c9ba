//! Daily and hourly reset instants.
//!
//! Countdowns that reset on a schedule ("refills at midnight", "next drop on
//! the hour") need the next day or hour boundary as their target. The
//! boundaries depend on a timezone, which is delegated to a
//! [`TimeZoneService`]. Every [`chrono::TimeZone`] (`Utc`, `Local`,
//! `FixedOffset`, ...) already is one.
//!
//! ```rust
//! use bubbletea_countdown::schedule::{next_day_start, next_hour_start};
//! use chrono::{FixedOffset, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 3, 10, 15, 42, 10).unwrap();
//! assert_eq!(next_day_start(&Utc, Some(base)), "2024-03-11T00:00:00.000Z");
//! assert_eq!(next_hour_start(&Utc, Some(base)), "2024-03-10T16:00:00.000Z");
//!
//! let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
//! assert_eq!(next_hour_start(&ist, Some(base)), "2024-03-10T22:00:00.000+05:30");
//! ```

use chrono::{
    DateTime, Days, Duration, MappedLocalTime, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Timelike, Utc,
};
use std::fmt;

/// Calendar operations that depend on a timezone.
pub trait TimeZoneService {
    /// Start of the local day containing `instant`.
    fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc>;

    /// Start of the local hour containing `instant`.
    fn start_of_hour(&self, instant: DateTime<Utc>) -> DateTime<Utc>;

    /// Moves `instant` by `days` local calendar days, keeping the wall-clock time.
    ///
    /// Results beyond the representable range saturate at
    /// [`DateTime::<Utc>::MAX_UTC`] or [`DateTime::<Utc>::MIN_UTC`].
    fn add_days(&self, instant: DateTime<Utc>, days: i64) -> DateTime<Utc>;

    /// ISO-8601 rendering of `instant` in this timezone.
    fn to_iso_string(&self, instant: DateTime<Utc>) -> String;
}

impl<Tz> TimeZoneService for Tz
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = instant
            .with_timezone(self)
            .date_naive()
            .and_time(NaiveTime::MIN);
        floor_local(self, midnight, instant).unwrap_or(instant)
    }

    fn start_of_hour(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local = instant.with_timezone(self).naive_local();
        local
            .date()
            .and_hms_opt(local.hour(), 0, 0)
            .and_then(|hour| floor_local(self, hour, instant))
            .unwrap_or(instant)
    }

    fn add_days(&self, instant: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        let local = instant.with_timezone(self).naive_local();
        let shifted = if days >= 0 {
            local.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            local.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted
            .and_then(|naive| from_local(self, naive))
            .or_else(|| {
                Duration::try_days(days).and_then(|delta| instant.checked_add_signed(delta))
            })
            .unwrap_or(if days >= 0 {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            })
    }

    fn to_iso_string(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(self)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Maps a local wall-clock time back to an instant. Ambiguous times take the
/// earlier instant; times skipped by a DST jump move one hour forward.
/// `None` only at the edges of the representable range.
fn from_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let later = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&later).earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

/// Like [`from_local`], but an ambiguous boundary resolves to the latest
/// candidate not after `instant`, so the boundary of the day or hour
/// containing `instant` never lies after it.
fn floor_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    instant: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        MappedLocalTime::Ambiguous(earliest, latest) => {
            let latest = latest.with_timezone(&Utc);
            if latest <= instant {
                Some(latest)
            } else {
                Some(earliest.with_timezone(&Utc))
            }
        }
        _ => from_local(tz, naive),
    }
}

/// Start of the next local day after `base`.
pub fn next_day_instant<Tz: TimeZoneService + ?Sized>(tz: &Tz, base: DateTime<Utc>) -> DateTime<Utc> {
    tz.add_days(tz.start_of_day(base), 1)
}

/// Start of the next local hour after `base`.
pub fn next_hour_instant<Tz: TimeZoneService + ?Sized>(
    tz: &Tz,
    base: DateTime<Utc>,
) -> DateTime<Utc> {
    tz.start_of_hour(base)
        .checked_add_signed(Duration::hours(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// ISO-8601 start of the next day in `tz`, counted from `base` or now.
pub fn next_day_start<Tz: TimeZoneService + ?Sized>(tz: &Tz, base: Option<DateTime<Utc>>) -> String {
    let base = base.unwrap_or_else(Utc::now);
    tz.to_iso_string(next_day_instant(tz, base))
}

/// ISO-8601 start of the next hour in `tz`, counted from `base` or now.
pub fn next_hour_start<Tz: TimeZoneService + ?Sized>(
    tz: &Tz,
    base: Option<DateTime<Utc>>,
) -> String {
    let base = base.unwrap_or_else(Utc::now);
    tz.to_iso_string(next_hour_instant(tz, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remaining::calculate_at;
    use chrono::{FixedOffset, NaiveDate, Offset};

    /// Summer time from 2024-03-31T01:00Z to 2024-10-27T01:00Z: local clocks
    /// skip 01:00-02:00 in March and repeat 01:00-02:00 in October.
    #[derive(Debug, Clone, Copy)]
    struct SummerTime;

    impl SummerTime {
        fn standard() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }
    }

    impl TimeZone for SummerTime {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SummerTime
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> MappedLocalTime<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::summer(), Self::standard()]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - Duration::seconds(offset.local_minus_utc() as i64);
                    self.offset_from_utc_datetime(&utc).fix() == *offset
                })
                .collect();
            match valid.as_slice() {
                [] => MappedLocalTime::None,
                [offset] => MappedLocalTime::Single(*offset),
                [earliest, latest, ..] => MappedLocalTime::Ambiguous(*earliest, *latest),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let starts = Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap().naive_utc();
            let ends = Utc.with_ymd_and_hms(2024, 10, 27, 1, 0, 0).unwrap().naive_utc();
            if *utc >= starts && *utc < ends {
                Self::summer()
            } else {
                Self::standard()
            }
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 42, 10).unwrap()
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_utc_boundaries() {
        assert_eq!(next_day_start(&Utc, Some(base())), "2024-03-11T00:00:00.000Z");
        assert_eq!(next_hour_start(&Utc, Some(base())), "2024-03-10T16:00:00.000Z");
    }

    #[test]
    fn test_offset_boundaries() {
        // 15:42:10Z is 21:12:10 at +05:30.
        assert_eq!(
            next_day_start(&ist(), Some(base())),
            "2024-03-11T00:00:00.000+05:30"
        );
        assert_eq!(
            next_hour_start(&ist(), Some(base())),
            "2024-03-10T22:00:00.000+05:30"
        );
    }

    #[test]
    fn test_local_date_differs_from_utc_date() {
        // 20:00Z on the 10th is already the 11th at UTC+08:00.
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(next_day_start(&tz, Some(base)), "2024-03-12T00:00:00.000+08:00");
    }

    #[test]
    fn test_service_operations() {
        let tz = ist();
        assert_eq!(
            tz.start_of_day(base()),
            Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap()
        );
        assert_eq!(
            tz.start_of_hour(base()),
            Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap()
        );
        assert_eq!(
            Utc.add_days(base(), -3),
            Utc.with_ymd_and_hms(2024, 3, 7, 15, 42, 10).unwrap()
        );
        assert_eq!(Utc.to_iso_string(base()), "2024-03-10T15:42:10.000Z");
    }

    #[test]
    fn test_boundary_as_countdown_target() {
        let target = next_hour_instant(&Utc, base());
        let remaining = calculate_at(target, base()).unwrap();
        assert_eq!(remaining.minutes, 17);
        assert_eq!(remaining.seconds, 50);
    }

    #[test]
    fn test_default_base_is_in_the_future() {
        let iso = next_day_start(&Utc, None);
        let parsed = DateTime::parse_from_rfc3339(&iso).unwrap();
        assert!(parsed > Utc::now());
        assert!(next_hour_start(&chrono::Local, None).len() >= 24);
    }

    #[test]
    fn test_add_days_saturates_instead_of_overflowing() {
        assert_eq!(Utc.add_days(base(), 1_000_000_000), DateTime::<Utc>::MAX_UTC);
        assert_eq!(Utc.add_days(base(), i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(Utc.add_days(base(), i64::MIN), DateTime::<Utc>::MIN_UTC);
        assert_eq!(ist().add_days(base(), -1_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(
            next_hour_instant(&Utc, DateTime::<Utc>::MAX_UTC),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_skipped_local_time_moves_forward() {
        // 01:30 local on the 31st does not exist; 02:30 summer time does.
        let base = Utc.with_ymd_and_hms(2024, 3, 30, 1, 30, 0).unwrap();
        let shifted = SummerTime.add_days(base, 1);
        assert_eq!(shifted, Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap());
        assert_eq!(
            SummerTime.to_iso_string(shifted),
            "2024-03-31T02:30:00.000+01:00"
        );
    }

    #[test]
    fn test_ambiguous_local_time_takes_earlier_instant() {
        // 01:30 local on the 27th happens twice; the summer-time one is first.
        let base = Utc.with_ymd_and_hms(2024, 10, 26, 0, 30, 0).unwrap();
        assert_eq!(
            SummerTime.add_days(base, 1),
            Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_next_hour_through_repeated_hour() {
        // First pass through 01:30 local, in summer time.
        let first = Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap();
        assert_eq!(
            SummerTime.start_of_hour(first),
            Utc.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap()
        );
        assert_eq!(
            next_hour_instant(&SummerTime, first),
            Utc.with_ymd_and_hms(2024, 10, 27, 1, 0, 0).unwrap()
        );

        // Second pass through 01:30 local, back on standard time.
        let second = Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap();
        assert_eq!(
            SummerTime.start_of_hour(second),
            Utc.with_ymd_and_hms(2024, 10, 27, 1, 0, 0).unwrap()
        );
        assert_eq!(
            next_hour_instant(&SummerTime, second),
            Utc.with_ymd_and_hms(2024, 10, 27, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_day_across_summer_time_change() {
        // The 31st is only 23 hours long in this zone.
        let base = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            next_day_start(&SummerTime, Some(base)),
            "2024-04-01T00:00:00.000+01:00"
        );
        assert_eq!(
            SummerTime.start_of_day(base),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
        );
    }
}
