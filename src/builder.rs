//! Day record assembly
//!
//! Turns ephemeris facts for one day into a [`DayRecord`], and a whole
//! [`JulianWindow`] into an ephemeris document.

use tracing::{debug, info};

use crate::data::{calendar, DayRecord, MoonRecord, ObserverPosition, SunRecord, TransitRecord};
use crate::ephemeris::{Ephemeris, EphemerisError, SolarDay};
use crate::window::JulianWindow;

/// Step used for the rising/waxing sign tests, in days (about 0.86 s)
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Builds day records for one observer
#[derive(Debug, Clone)]
pub struct DayRecordBuilder<E> {
    ephemeris: E,
    observer: ObserverPosition,
    epsilon: f64,
}

impl<E: Ephemeris> DayRecordBuilder<E> {
    pub fn new(ephemeris: E, observer: ObserverPosition) -> Self {
        Self {
            ephemeris,
            observer,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Overrides the finite-difference step
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builds the record for the day whose reference moment is `jd`
    pub fn build_day(&self, jd: f64) -> Result<DayRecord, EphemerisError> {
        let solar_day = self.solar_day(jd)?;

        let transit = solar_day.transit();
        let transit_alt = self.sun_altitude(transit)?;

        let sun_alt = self.sun_altitude(jd)?;
        let moon_alt = self.moon_altitude(jd);
        let phase = self.ephemeris.lunar_phase(jd);

        Ok(DayRecord {
            now: calendar(jd),
            sun: SunRecord {
                alt: sun_alt,
                rising: sun_alt > self.sun_altitude(jd - self.epsilon)?,
                rise: solar_day.rise().map(calendar),
                transit: TransitRecord {
                    at: calendar(transit),
                    alt: transit_alt,
                },
                set: solar_day.set().map(calendar),
            },
            moon: MoonRecord {
                phase,
                // Phase angle shrinks towards full moon
                waxing: phase < self.ephemeris.lunar_phase(jd - self.epsilon),
                alt: moon_alt,
                rising: moon_alt > self.moon_altitude(jd - self.epsilon),
            },
        })
    }

    /// Builds one record per day of `window`, in ascending order
    ///
    /// Fails as a whole if any single day fails.
    pub fn build_document(&self, window: &JulianWindow) -> Result<Vec<DayRecord>, EphemerisError> {
        let records = window
            .days()
            .map(|jd| self.build_day(jd))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            days = records.len(),
            start = window.start,
            end = window.end,
            lat = self.observer.latitude,
            lng = self.observer.longitude,
            "Built ephemeris document"
        );
        Ok(records)
    }

    /// Rise/transit/set for the day of `jd`
    ///
    /// An engine may hand back the events of the adjacent day near local
    /// offset boundaries; when the rise lands on another date the triple is
    /// taken from `jd - 1` instead.
    fn solar_day(&self, jd: f64) -> Result<SolarDay, EphemerisError> {
        let day = self.ephemeris.solar_rst(jd, &self.observer)?;

        if let Some(rise) = day.rise() {
            if !calendar(rise).same_date(&calendar(jd)) {
                debug!(jd, rise, "Rise fell on another date, retaking from previous day");
                return self.ephemeris.solar_rst(jd - 1.0, &self.observer);
            }
        }
        Ok(day)
    }

    fn sun_altitude(&self, jd: f64) -> Result<f64, EphemerisError> {
        Ok(self.ephemeris.solar_horizontal(jd, &self.observer)?.alt)
    }

    fn moon_altitude(&self, jd: f64) -> f64 {
        let equ = self.ephemeris.lunar_equatorial(jd);
        self.ephemeris.horizontal(&equ, &self.observer, jd).alt
    }
}
