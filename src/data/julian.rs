//! Julian day conversions
//!
//! The Julian day is the continuous time axis the window planner and the
//! ephemeris engine exchange. Conversions follow the standard algorithm from
//! Meeus, *Astronomical Algorithms*, chapter 7: Gregorian calendar from
//! 1582-10-15 onwards, Julian calendar before that.

use chrono::{DateTime, Datelike, Timelike, Utc};

use super::CalendarInstant;

/// Julian day of the Unix epoch, 1970-01-01T00:00:00Z
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// First Julian day number of the Gregorian calendar (1582-10-15)
const GREGORIAN_START_JDN: i64 = 2_299_161;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Converts a calendar instant to a Julian day
pub fn julian_day(instant: &CalendarInstant) -> f64 {
    let mut year = i64::from(instant.year);
    let mut month = i64::from(instant.month);
    if month <= 2 {
        year -= 1;
        month += 12;
    }

    let day_fraction = (f64::from(instant.hour)
        + (f64::from(instant.minute) + instant.second / 60.0) / 60.0)
        / 24.0;
    let day = f64::from(instant.day) + day_fraction;

    let gregorian = (instant.year, instant.month, instant.day) >= (1582, 10, 15);
    let b = if gregorian {
        let a = year.div_euclid(100);
        2 - a + a.div_euclid(4)
    } else {
        0
    };

    (365.25 * (year + 4716) as f64).floor() + (30.6001 * (month + 1) as f64).floor() + day
        + b as f64
        - 1524.5
}

/// Converts a Julian day to a calendar instant
///
/// The time of day is rounded to the millisecond; rounding that reaches
/// midnight carries into the next date.
pub fn calendar(jd: f64) -> CalendarInstant {
    let shifted = jd + 0.5;
    let mut z = shifted.floor() as i64;
    let mut millis = ((shifted - shifted.floor()) * MILLIS_PER_DAY as f64).round() as i64;
    if millis >= MILLIS_PER_DAY {
        z += 1;
        millis -= MILLIS_PER_DAY;
    }

    let a = if z < GREGORIAN_START_JDN {
        z
    } else {
        let alpha = ((z as f64 - 1_867_216.25) / 36_524.25).floor() as i64;
        z + 1 + alpha - alpha.div_euclid(4)
    };
    let b = a + 1524;
    let c = ((b as f64 - 122.1) / 365.25).floor() as i64;
    let d = (365.25 * c as f64).floor() as i64;
    let e = ((b - d) as f64 / 30.6001).floor() as i64;

    let day = b - d - (30.6001 * e as f64).floor() as i64;
    let month = if e < 14 { e - 1 } else { e - 13 };
    let year = if month > 2 { c - 4716 } else { c - 4715 };

    CalendarInstant {
        year: year as i32,
        month: month as u32,
        day: day as u32,
        hour: (millis / 3_600_000) as u32,
        minute: ((millis % 3_600_000) / 60_000) as u32,
        second: (millis % 60_000) as f64 / 1000.0,
    }
}

/// Julian day of a UTC timestamp, truncated to the millisecond
pub fn julian_day_from_datetime(at: DateTime<Utc>) -> f64 {
    UNIX_EPOCH_JD + at.timestamp_millis() as f64 / MILLIS_PER_DAY as f64
}

/// UTC timestamp of a Julian day, rounded to the millisecond
///
/// Returns `None` for non-finite days and days chrono cannot represent.
pub fn datetime_from_julian_day(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JD) * MILLIS_PER_DAY as f64).round();
    DateTime::from_timestamp_millis(millis as i64)
}

/// Truncates to whole milliseconds, the precision [`calendar`] keeps.
/// Anything finer could round across midnight and move the instant to the
/// next date.
impl From<DateTime<Utc>> for CalendarInstant {
    fn from(at: DateTime<Utc>) -> Self {
        // Leap seconds report 1000+ ms
        let millis = at.timestamp_subsec_millis().min(999);
        Self {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            second: f64::from(at.second()) + f64::from(millis) / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seconds_of_day(c: &CalendarInstant) -> f64 {
        f64::from(c.hour) * 3600.0 + f64::from(c.minute) * 60.0 + c.second
    }

    #[test]
    fn test_j2000_epoch() {
        let j2000 = CalendarInstant::date(2000, 1, 1).with_time(12, 0, 0.0);
        assert!((julian_day(&j2000) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn test_sputnik_launch() {
        // 1957 October 4.81
        let instant = CalendarInstant::date(1957, 10, 4).with_time(19, 26, 24.0);
        assert!((julian_day(&instant) - 2_436_116.31).abs() < 1e-6);

        let back = calendar(2_436_116.31);
        assert_eq!((back.year, back.month, back.day), (1957, 10, 4));
        assert_eq!((back.hour, back.minute), (19, 26));
        assert!((back.second - 24.0).abs() < 0.01);
    }

    #[test]
    fn test_julian_calendar_dates() {
        let instant = CalendarInstant::date(333, 1, 27).with_time(12, 0, 0.0);
        assert!((julian_day(&instant) - 1_842_713.0).abs() < 1e-9);

        let back = calendar(1_842_713.0);
        assert_eq!((back.year, back.month, back.day, back.hour), (333, 1, 27, 12));
    }

    #[test]
    fn test_leap_day_is_one_day() {
        let feb29 = julian_day(&CalendarInstant::date(2012, 2, 29));
        let mar1 = julian_day(&CalendarInstant::date(2012, 3, 1));
        let feb28_2011 = julian_day(&CalendarInstant::date(2011, 2, 28));
        let mar1_2011 = julian_day(&CalendarInstant::date(2011, 3, 1));

        assert!((mar1 - feb29 - 1.0).abs() < 1e-9);
        assert!((mar1_2011 - feb28_2011 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_one_second() {
        let samples = [
            CalendarInstant::date(1999, 12, 31).with_time(23, 59, 59.5),
            CalendarInstant::date(2000, 2, 29).with_time(0, 0, 0.0),
            CalendarInstant::date(2009, 12, 31).with_time(12, 0, 0.0),
            CalendarInstant::date(2011, 6, 15).with_time(8, 17, 42.25),
            CalendarInstant::date(2012, 12, 30).with_time(12, 0, 0.0),
            CalendarInstant::date(2024, 3, 1).with_time(6, 30, 5.0),
            CalendarInstant::date(2038, 1, 19).with_time(3, 14, 7.0),
        ];

        for sample in samples {
            let back = calendar(julian_day(&sample));
            assert!(
                sample.same_date(&back),
                "date changed in round trip: {:?} -> {:?}",
                sample,
                back
            );
            assert!(
                (seconds_of_day(&sample) - seconds_of_day(&back)).abs() < 1.0,
                "time drifted in round trip: {:?} -> {:?}",
                sample,
                back
            );
        }
    }

    #[test]
    fn test_rounding_carries_into_next_day() {
        // A hair before midnight rounds up to the next date
        let jd = julian_day(&CalendarInstant::date(2011, 12, 31)) + 1.0 - 1e-9;
        let back = calendar(jd);
        assert_eq!((back.year, back.month, back.day), (2012, 1, 1));
        assert_eq!((back.hour, back.minute), (0, 0));
        assert!(back.second.abs() < 1e-9);
    }

    #[test]
    fn test_noon_is_exact() {
        let back = calendar(2_455_728.0);
        assert_eq!((back.year, back.month, back.day), (2011, 6, 15));
        assert_eq!((back.hour, back.minute), (12, 0));
        assert!(back.second.abs() < 1e-9);
    }

    #[test]
    fn test_datetime_conversions_agree() {
        let at = Utc.with_ymd_and_hms(2011, 6, 15, 18, 0, 0).unwrap();
        let instant = CalendarInstant::from(at);

        assert_eq!((instant.year, instant.month, instant.day), (2011, 6, 15));
        assert_eq!(instant.hour, 18);
        assert!((julian_day_from_datetime(at) - julian_day(&instant)).abs() < 1e-8);
        assert!((julian_day_from_datetime(at) - 2_455_728.25).abs() < 1e-8);
    }

    #[test]
    fn test_sub_millisecond_before_midnight_stays_on_date() {
        let at = Utc.with_ymd_and_hms(2011, 6, 15, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_800);
        let instant = CalendarInstant::from(at);

        assert_eq!((instant.year, instant.month, instant.day), (2011, 6, 15));
        assert!((instant.second - 59.999).abs() < 1e-9);

        let back = calendar(julian_day(&instant));
        assert_eq!((back.year, back.month, back.day), (2011, 6, 15));
        assert_eq!((back.hour, back.minute), (23, 59));
        assert!((julian_day(&instant) - julian_day_from_datetime(at)).abs() < 1e-8);
    }

    #[test]
    fn test_datetime_from_julian_day() {
        let at = datetime_from_julian_day(2_455_728.25).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2011, 6, 15, 18, 0, 0).unwrap());

        let noon = datetime_from_julian_day(2_451_545.0).unwrap();
        assert_eq!(noon, Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap());

        assert!(datetime_from_julian_day(f64::NAN).is_none());
        assert!(datetime_from_julian_day(1e300).is_none());
    }
}
