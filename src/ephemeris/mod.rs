//! Astronomical computation capability
//!
//! The almanac treats the ephemeris as an external collaborator behind the
//! [`Ephemeris`] trait: a pure function of Julian day and observer position.
//! [`AnalyticEphemeris`] is the built-in implementation.
//!
//! All angles are degrees. Longitudes are east-positive.

mod analytic;

pub use analytic::AnalyticEphemeris;

use thiserror::Error;

use crate::data::ObserverPosition;

/// Errors reported by an ephemeris engine
#[derive(Debug, Error, PartialEq)]
pub enum EphemerisError {
    /// The Julian day is NaN or infinite
    #[error("Julian day is not finite: {0}")]
    NonFiniteJulianDay(f64),

    /// The observer coordinates are NaN or infinite
    #[error("Observer position is not finite: lat {latitude}, lng {longitude}")]
    NonFinitePosition { latitude: f64, longitude: f64 },

    /// The Julian day is outside the range the engine can convert
    #[error("Julian day out of range: {0}")]
    OutOfRange(f64),

    /// The solar position algorithm rejected its input
    #[error("Solar position computation failed: {0}")]
    Solar(String),
}

/// Right ascension and declination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquatorialPosition {
    /// Right ascension, 0..360
    pub ra: f64,
    /// Declination, -90..90
    pub dec: f64,
}

/// Geometric ecliptic coordinates of the Sun as seen from the Earth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricPosition {
    /// Ecliptic longitude
    pub l: f64,
    /// Ecliptic latitude
    pub b: f64,
    /// Radius vector in astronomical units
    pub r: f64,
}

/// Altitude and azimuth for an observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    /// Altitude above the horizon
    pub alt: f64,
    /// Azimuth measured westward from south
    pub az: f64,
}

/// Rise, transit and set of the Sun for one day, as Julian days
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarDay {
    /// The Sun crosses the horizon both ways
    Regular { rise: f64, transit: f64, set: f64 },
    /// Polar day: the Sun stays above the horizon
    AlwaysAbove { transit: f64 },
    /// Polar night: the Sun stays below the horizon
    AlwaysBelow { transit: f64 },
}

impl SolarDay {
    pub fn rise(&self) -> Option<f64> {
        match self {
            SolarDay::Regular { rise, .. } => Some(*rise),
            _ => None,
        }
    }

    pub fn transit(&self) -> f64 {
        match self {
            SolarDay::Regular { transit, .. }
            | SolarDay::AlwaysAbove { transit }
            | SolarDay::AlwaysBelow { transit } => *transit,
        }
    }

    pub fn set(&self) -> Option<f64> {
        match self {
            SolarDay::Regular { set, .. } => Some(*set),
            _ => None,
        }
    }
}

/// The astronomical facts the day record builder consumes
pub trait Ephemeris {
    /// Rise, transit and set of the Sun on the day containing `jd`
    fn solar_rst(&self, jd: f64, observer: &ObserverPosition) -> Result<SolarDay, EphemerisError>;

    /// Apparent equatorial coordinates of the Sun
    fn solar_equatorial(&self, jd: f64) -> EquatorialPosition;

    /// Geometric ecliptic coordinates of the Sun
    fn solar_geometric(&self, jd: f64) -> GeometricPosition;

    /// Converts equatorial coordinates to the observer's horizon at `jd`
    fn horizontal(
        &self,
        equatorial: &EquatorialPosition,
        observer: &ObserverPosition,
        jd: f64,
    ) -> HorizontalPosition;

    /// Altitude and azimuth of the Sun for an observer at `jd`
    ///
    /// Defaults to [`Ephemeris::horizontal`] of [`Ephemeris::solar_equatorial`];
    /// engines with a dedicated solar algorithm override it.
    fn solar_horizontal(
        &self,
        jd: f64,
        observer: &ObserverPosition,
    ) -> Result<HorizontalPosition, EphemerisError> {
        Ok(self.horizontal(&self.solar_equatorial(jd), observer, jd))
    }

    /// Lunar phase angle: 0 full, 180 new
    fn lunar_phase(&self, jd: f64) -> f64;

    /// Geocentric equatorial coordinates of the Moon
    fn lunar_equatorial(&self, jd: f64) -> EquatorialPosition;
}

impl<T: Ephemeris + ?Sized> Ephemeris for &T {
    fn solar_rst(&self, jd: f64, observer: &ObserverPosition) -> Result<SolarDay, EphemerisError> {
        (**self).solar_rst(jd, observer)
    }

    fn solar_equatorial(&self, jd: f64) -> EquatorialPosition {
        (**self).solar_equatorial(jd)
    }

    fn solar_geometric(&self, jd: f64) -> GeometricPosition {
        (**self).solar_geometric(jd)
    }

    fn horizontal(
        &self,
        equatorial: &EquatorialPosition,
        observer: &ObserverPosition,
        jd: f64,
    ) -> HorizontalPosition {
        (**self).horizontal(equatorial, observer, jd)
    }

    fn solar_horizontal(
        &self,
        jd: f64,
        observer: &ObserverPosition,
    ) -> Result<HorizontalPosition, EphemerisError> {
        (**self).solar_horizontal(jd, observer)
    }

    fn lunar_phase(&self, jd: f64) -> f64 {
        (**self).lunar_phase(jd)
    }

    fn lunar_equatorial(&self, jd: f64) -> EquatorialPosition {
        (**self).lunar_equatorial(jd)
    }
}
