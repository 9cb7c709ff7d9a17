//! Core data models for the almanac
//!
//! This module contains the types that make up an ephemeris document: the
//! observer position, calendar instants, and the per-day records serialized
//! to JSON.

pub mod julian;

pub use julian::{calendar, datetime_from_julian_day, julian_day, julian_day_from_datetime};

use serde::{Deserialize, Serialize};

/// Kotka, Finland. Used whenever a request carries no usable location.
pub const DEFAULT_LATITUDE: f64 = 60.46636;
/// Kotka, Finland (east-positive)
pub const DEFAULT_LONGITUDE: f64 = 26.94663;

/// Geographic position of the observer
///
/// Longitude is east-positive. Both values are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPosition {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl ObserverPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside their physical ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Default for ObserverPosition {
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}

/// A UTC calendar date and time of day
///
/// Field order matches the JSON encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarInstant {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31
    pub day: u32,
    /// 0-23
    pub hour: u32,
    /// 0-59
    pub minute: u32,
    /// Seconds with fractional part, 0 <= second < 60
    pub second: f64,
}

impl CalendarInstant {
    /// Midnight at the start of the given date
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0.0,
        }
    }

    /// Returns a copy with the time of day replaced
    pub fn with_time(self, hour: u32, minute: u32, second: f64) -> Self {
        Self {
            hour,
            minute,
            second,
            ..self
        }
    }

    /// Whether two instants fall on the same calendar date
    pub fn same_date(&self, other: &CalendarInstant) -> bool {
        self.year == other.year && self.month == other.month && self.day == other.day
    }
}

/// Transit instant together with the altitude reached there
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitRecord {
    #[serde(flatten)]
    pub at: CalendarInstant,
    /// Altitude at transit in degrees
    pub alt: f64,
}

/// Solar facts for one day
///
/// `rise` and `set` are `None` on days when the Sun stays above or below
/// the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunRecord {
    /// Altitude at the record's reference moment, degrees
    pub alt: f64,
    /// Whether the altitude is increasing at the reference moment
    pub rising: bool,
    pub rise: Option<CalendarInstant>,
    pub transit: TransitRecord,
    pub set: Option<CalendarInstant>,
}

/// Lunar facts for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonRecord {
    /// Phase angle in degrees: 0 full, 180 new
    pub phase: f64,
    pub waxing: bool,
    /// Altitude at the record's reference moment, degrees
    pub alt: f64,
    pub rising: bool,
}

/// One entry of the ephemeris document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Reference moment of this record
    pub now: CalendarInstant,
    pub sun: SunRecord,
    pub moon: MoonRecord,
}
