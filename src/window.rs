//! Date window planning
//!
//! Decides which calendar days a document covers. Bounds are computed through
//! the calendar-to-Julian-day conversion so month lengths and leap years come
//! out right without any day counting.

use serde::{Deserialize, Serialize};

use crate::data::{julian_day, CalendarInstant};

/// Which span of days a document covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Previous, current and next calendar year, anchored at 12:00 UT
    #[default]
    Yearly,
    /// Previous, current and next calendar month, at the request's time of day
    Monthly,
}

impl WindowPolicy {
    /// Parses a policy name, case-insensitively
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yearly" | "year" => Some(WindowPolicy::Yearly),
            "monthly" | "month" => Some(WindowPolicy::Monthly),
            _ => None,
        }
    }

    /// Short name used in cache fingerprints
    pub fn tag(&self) -> &'static str {
        match self {
            WindowPolicy::Yearly => "yearly",
            WindowPolicy::Monthly => "monthly",
        }
    }

    /// Computes the window of days to iterate for a request made at `now`
    ///
    /// Yearly: Dec 31 12:00 two years before `now`'s year through Dec 30
    /// 12:00 of the following year.
    ///
    /// Monthly: the 1st of the month before `now`'s month through two days
    /// before the 1st of the month after `now`'s month, both at `now`'s time
    /// of day.
    pub fn plan(&self, now: &CalendarInstant) -> JulianWindow {
        match self {
            WindowPolicy::Yearly => {
                let start = CalendarInstant::date(now.year - 2, 12, 31).with_time(12, 0, 0.0);
                let end = CalendarInstant::date(now.year + 1, 12, 30).with_time(12, 0, 0.0);
                JulianWindow::new(julian_day(&start), julian_day(&end))
            }
            WindowPolicy::Monthly => {
                let (start_year, start_month) = shift_month(now.year, now.month, -1);
                let (after_year, after_month) = shift_month(now.year, now.month, 2);

                let start = CalendarInstant::date(start_year, start_month, 1).with_time(
                    now.hour,
                    now.minute,
                    now.second,
                );
                let after = CalendarInstant::date(after_year, after_month, 1).with_time(
                    now.hour,
                    now.minute,
                    now.second,
                );
                JulianWindow::new(julian_day(&start), julian_day(&after) - 2.0)
            }
        }
    }
}

/// Moves a (year, month) pair by `delta` months
fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Inclusive range of Julian days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianWindow {
    pub start: f64,
    pub end: f64,
}

impl JulianWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Number of days iterated, counting the day that contains `end`
    pub fn day_count(&self) -> usize {
        let first = (self.start + 0.5).floor();
        let last = (self.end + 0.5).floor();
        if last < first {
            0
        } else {
            (last - first) as usize + 1
        }
    }

    /// The reference Julian day of every iterated day, in ascending order
    pub fn days(&self) -> impl Iterator<Item = f64> {
        let start = self.start;
        (0..self.day_count()).map(move |offset| start + offset as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::calendar;

    fn ymd(c: &CalendarInstant) -> (i32, u32, u32) {
        (c.year, c.month, c.day)
    }

    #[test]
    fn test_yearly_window_mid_2011() {
        let now = CalendarInstant::date(2011, 6, 15).with_time(9, 30, 0.0);
        let window = WindowPolicy::Yearly.plan(&now);

        let start = calendar(window.start);
        let end = calendar(window.end);
        assert_eq!(ymd(&start), (2009, 12, 31));
        assert_eq!((start.hour, start.minute), (12, 0));
        assert_eq!(ymd(&end), (2012, 12, 30));
        assert_eq!((end.hour, end.minute), (12, 0));

        // 2010 + 2011 + 2012 (leap)
        assert_eq!(window.day_count(), 365 + 365 + 366);
    }

    #[test]
    fn test_monthly_window_mid_2011() {
        let now = CalendarInstant::date(2011, 6, 15).with_time(9, 30, 0.0);
        let window = WindowPolicy::Monthly.plan(&now);

        assert_eq!(ymd(&calendar(window.start)), (2011, 5, 1));
        assert_eq!(ymd(&calendar(window.end)), (2011, 7, 30));
        assert_eq!(window.day_count(), 31 + 30 + 30);
    }

    #[test]
    fn test_monthly_window_keeps_time_of_day() {
        let now = CalendarInstant::date(2011, 6, 15).with_time(18, 45, 30.0);
        let window = WindowPolicy::Monthly.plan(&now);

        let start = calendar(window.start);
        assert_eq!((start.hour, start.minute), (18, 45));
        assert!((start.second - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_monthly_window_boundary_table() {
        // (now, expected start, expected end, day count)
        let cases = [
            ((2011, 1, 10), (2010, 12, 1), (2011, 2, 27), 31 + 31 + 27),
            ((2012, 1, 10), (2011, 12, 1), (2012, 2, 28), 31 + 31 + 28),
            ((2012, 3, 31), (2012, 2, 1), (2012, 4, 29), 29 + 31 + 29),
            ((2011, 11, 5), (2011, 10, 1), (2011, 12, 30), 31 + 30 + 30),
            ((2011, 12, 25), (2011, 11, 1), (2012, 1, 30), 30 + 31 + 30),
        ];

        for ((y, m, d), expected_start, expected_end, count) in cases {
            let now = CalendarInstant::date(y, m, d).with_time(12, 0, 0.0);
            let window = WindowPolicy::Monthly.plan(&now);

            assert_eq!(ymd(&calendar(window.start)), expected_start, "start for {:?}", (y, m, d));
            assert_eq!(ymd(&calendar(window.end)), expected_end, "end for {:?}", (y, m, d));
            assert_eq!(window.day_count(), count, "day count for {:?}", (y, m, d));
        }
    }

    #[test]
    fn test_yearly_window_boundary_table() {
        let cases = [
            ((2000, 1, 1), (1997, 12, 31), (2000, 12, 30)),
            ((2011, 12, 31), (2009, 12, 31), (2012, 12, 30)),
            ((2024, 2, 29), (2022, 12, 31), (2025, 12, 30)),
        ];

        for ((y, m, d), expected_start, expected_end) in cases {
            let now = CalendarInstant::date(y, m, d);
            let window = WindowPolicy::Yearly.plan(&now);

            assert_eq!(ymd(&calendar(window.start)), expected_start);
            assert_eq!(ymd(&calendar(window.end)), expected_end);
        }
    }

    #[test]
    fn test_days_are_consecutive_and_unique() {
        let now = CalendarInstant::date(2011, 6, 15).with_time(12, 0, 0.0);
        let window = WindowPolicy::Monthly.plan(&now);

        let dates: Vec<_> = window.days().map(|jd| ymd(&calendar(jd))).collect();
        assert_eq!(dates.len(), window.day_count());
        assert_eq!(dates.first(), Some(&(2011, 5, 1)));
        assert_eq!(dates.last(), Some(&(2011, 7, 30)));

        let day_numbers: Vec<f64> = window.days().map(|jd| (jd + 0.5).floor()).collect();
        for pair in day_numbers.windows(2) {
            assert_eq!(pair[1] - pair[0], 1.0);
        }
    }

    #[test]
    fn test_end_falling_mid_day_is_included() {
        let window = JulianWindow::new(2_455_700.5, 2_455_702.75);
        // Days starting 2455700.5 and 2455701.5, plus the day containing 06:00 of the third
        assert_eq!(window.day_count(), 3);

        let empty = JulianWindow::new(2_455_702.5, 2_455_700.5);
        assert_eq!(empty.day_count(), 0);
    }

    #[test]
    fn test_request_just_before_midnight_keeps_its_date() {
        use chrono::{TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2011, 6, 15, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_800);
        let window = WindowPolicy::Monthly.plan(&CalendarInstant::from(at));

        let dates: Vec<_> = window.days().map(|jd| ymd(&calendar(jd))).collect();
        assert_eq!(window.day_count(), 91);
        assert_eq!(dates.first(), Some(&(2011, 5, 1)));
        assert_eq!(dates.last(), Some(&(2011, 7, 30)));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(WindowPolicy::from_name("yearly"), Some(WindowPolicy::Yearly));
        assert_eq!(WindowPolicy::from_name("Monthly"), Some(WindowPolicy::Monthly));
        assert_eq!(WindowPolicy::from_name("weekly"), None);
        assert_eq!(WindowPolicy::default().tag(), "yearly");
    }
}
