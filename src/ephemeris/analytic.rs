//! Built-in ephemeris
//!
//! Solar rise/transit/set and the Sun's altitude come from the NREL Solar
//! Position Algorithm in `solar-positioning`. Lunar coordinates use a
//! truncated periodic series and the Sun's ecliptic coordinates the
//! low-accuracy solar theory, both from Meeus, *Astronomical Algorithms*
//! (chapters 12, 13, 22, 25, 47, 48). Lunar results are good to a few tenths
//! of a degree.

use solar_positioning::time::DeltaT;
use solar_positioning::{spa, Horizon, RefractionCorrection, SunriseResult};

use super::{
    Ephemeris, EphemerisError, EquatorialPosition, GeometricPosition, HorizontalPosition, SolarDay,
};
use crate::data::{calendar, datetime_from_julian_day, CalendarInstant, ObserverPosition};

/// Julian day of the J2000.0 epoch
const J2000: f64 = 2_451_545.0;

/// Kilometres per astronomical unit
const AU_KM: f64 = 149_597_870.7;

/// Standard atmosphere used for refraction, hPa and degrees Celsius
const PRESSURE_HPA: f64 = 1013.25;
const TEMPERATURE_C: f64 = 15.0;

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Reduces an angle to 0..360
fn normalize(x: f64) -> f64 {
    x.rem_euclid(360.0)
}

/// Julian centuries since J2000.0
fn centuries(jd: f64) -> f64 {
    (jd - J2000) / 36_525.0
}

/// Longitude of the Moon's ascending node, used for the nutation terms
fn node_longitude(t: f64) -> f64 {
    125.04 - 1_934.136 * t
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.8150 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

fn apparent_obliquity(t: f64) -> f64 {
    mean_obliquity(t) + 0.00256 * cos_deg(node_longitude(t))
}

fn ecliptic_to_equatorial(lambda: f64, beta: f64, epsilon: f64) -> EquatorialPosition {
    let (sin_l, cos_l) = lambda.to_radians().sin_cos();
    let (sin_b, cos_b) = beta.to_radians().sin_cos();
    let (sin_e, cos_e) = epsilon.to_radians().sin_cos();

    let ra = (sin_l * cos_e - (sin_b / cos_b) * sin_e).atan2(cos_l);
    let dec = (sin_b * cos_e + cos_b * sin_e * sin_l).asin();

    EquatorialPosition {
        ra: normalize(ra.to_degrees()),
        dec: dec.to_degrees(),
    }
}

/// Greenwich mean sidereal time in degrees
fn sidereal_time(jd: f64) -> f64 {
    let t = centuries(jd);
    normalize(
        280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Altitude of a body with declination `dec` at local hour angle `hour_angle`
fn altitude(latitude: f64, dec: f64, hour_angle: f64) -> f64 {
    (sin_deg(latitude) * sin_deg(dec) + cos_deg(latitude) * cos_deg(dec) * cos_deg(hour_angle))
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees()
}

fn solar_error(e: impl std::fmt::Display) -> EphemerisError {
    EphemerisError::Solar(e.to_string())
}

fn check_inputs(jd: f64, observer: &ObserverPosition) -> Result<(), EphemerisError> {
    if !jd.is_finite() {
        return Err(EphemerisError::NonFiniteJulianDay(jd));
    }
    if !observer.latitude.is_finite() || !observer.longitude.is_finite() {
        return Err(EphemerisError::NonFinitePosition {
            latitude: observer.latitude,
            longitude: observer.longitude,
        });
    }
    Ok(())
}

/// Estimated TT - UT in seconds for the month of `date`
fn delta_t(date: &CalendarInstant) -> Result<f64, EphemerisError> {
    DeltaT::estimate_from_date(date.year, date.month).map_err(solar_error)
}

/// 0h UT of the date containing `jd`
fn start_of_day(jd: f64) -> f64 {
    (jd - 0.5).floor() + 0.5
}

/// Geocentric ecliptic longitude, latitude and distance (km) of the Moon
struct LunarEcliptic {
    lambda: f64,
    beta: f64,
    distance: f64,
}

/// Built-in [`Ephemeris`] implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Sunrise, transit and sunset of the date starting at `jd0`, in hours
    /// after that midnight. Events belonging to a neighbouring date come back
    /// below 0 or from 24 up.
    fn solar_hours(&self, jd0: f64, observer: &ObserverPosition) -> Result<SolarDay, EphemerisError> {
        let date = calendar(jd0);
        let result = spa::sunrise_sunset_utc_for_horizon(
            date.year,
            date.month,
            date.day,
            observer.latitude,
            observer.longitude,
            delta_t(&date)?,
            Horizon::SunriseSunset,
        )
        .map_err(solar_error)?;

        Ok(match result {
            SunriseResult::RegularDay {
                sunrise,
                transit,
                sunset,
            } => SolarDay::Regular {
                rise: sunrise.hours(),
                transit: transit.hours(),
                set: sunset.hours(),
            },
            SunriseResult::AllDay { transit } => SolarDay::AlwaysAbove {
                transit: transit.hours(),
            },
            SunriseResult::AllNight { transit } => SolarDay::AlwaysBelow {
                transit: transit.hours(),
            },
        })
    }

    /// Moves an event that fell on a neighbouring date back into the day
    /// starting at `jd0`, taking the same event from that neighbour's
    /// computation. Falls back to wrapping the hours when the neighbour has
    /// no such event.
    fn within_day(
        &self,
        jd0: f64,
        observer: &ObserverPosition,
        hours: f64,
        event: fn(&SolarDay) -> Option<f64>,
    ) -> Result<f64, EphemerisError> {
        if (0.0..24.0).contains(&hours) {
            return Ok(hours);
        }

        let shift = if hours < 0.0 { 1.0 } else { -1.0 };
        let neighbour = self.solar_hours(jd0 + shift, observer)?;
        Ok(match event(&neighbour).map(|h| h + 24.0 * shift) {
            Some(h) if (0.0..24.0).contains(&h) => h,
            _ => hours.rem_euclid(24.0),
        })
    }

    /// Apparent longitude of the Sun together with its distance in AU
    fn solar_apparent_longitude(&self, jd: f64) -> (f64, f64) {
        let t = centuries(jd);
        let geometric = self.solar_geometric(jd);
        let lambda = geometric.l - 0.00569 - 0.00478 * sin_deg(node_longitude(t));
        (normalize(lambda), geometric.r)
    }

    fn lunar_ecliptic(&self, jd: f64) -> LunarEcliptic {
        let t = centuries(jd);

        let lp = 218.316_447_7 + 481_267.881_234_21 * t;
        let d = 297.850_192_1 + 445_267.111_403_4 * t;
        let m = 357.529_109_2 + 35_999.050_290_9 * t;
        let mp = 134.963_396_4 + 477_198.867_505_5 * t;
        let f = 93.272_095_0 + 483_202.017_523_3 * t;
        let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;

        let longitude_terms = 6.288_774 * sin_deg(mp)
            + 1.274_027 * sin_deg(2.0 * d - mp)
            + 0.658_314 * sin_deg(2.0 * d)
            + 0.213_618 * sin_deg(2.0 * mp)
            - 0.185_116 * e * sin_deg(m)
            - 0.114_332 * sin_deg(2.0 * f)
            + 0.058_793 * sin_deg(2.0 * d - 2.0 * mp)
            + 0.057_066 * e * sin_deg(2.0 * d - m - mp)
            + 0.053_322 * sin_deg(2.0 * d + mp)
            + 0.045_758 * e * sin_deg(2.0 * d - m)
            - 0.040_923 * e * sin_deg(m - mp)
            - 0.034_720 * sin_deg(d)
            - 0.030_383 * e * sin_deg(m + mp);

        let latitude_terms = 5.128_122 * sin_deg(f)
            + 0.280_602 * sin_deg(mp + f)
            + 0.277_693 * sin_deg(mp - f)
            + 0.173_237 * sin_deg(2.0 * d - f)
            + 0.055_413 * sin_deg(2.0 * d - mp + f)
            + 0.046_271 * sin_deg(2.0 * d - mp - f);

        let distance = 385_000.56
            - 20_905.355 * cos_deg(mp)
            - 3_699.111 * cos_deg(2.0 * d - mp)
            - 2_955.968 * cos_deg(2.0 * d)
            - 569.925 * cos_deg(2.0 * mp);

        // Nutation in longitude, principal term only
        let nutation = -0.004_78 * sin_deg(node_longitude(t));

        LunarEcliptic {
            lambda: normalize(lp + longitude_terms + nutation),
            beta: latitude_terms,
            distance,
        }
    }
}

impl Ephemeris for AnalyticEphemeris {
    fn solar_rst(&self, jd: f64, observer: &ObserverPosition) -> Result<SolarDay, EphemerisError> {
        check_inputs(jd, observer)?;

        let jd0 = start_of_day(jd);
        let to_jd = |hours: f64| jd0 + hours / 24.0;

        Ok(match self.solar_hours(jd0, observer)? {
            SolarDay::Regular { rise, transit, set } => SolarDay::Regular {
                rise: to_jd(self.within_day(jd0, observer, rise, SolarDay::rise)?),
                transit: to_jd(self.within_day(jd0, observer, transit, |d| Some(d.transit()))?),
                set: to_jd(self.within_day(jd0, observer, set, SolarDay::set)?),
            },
            SolarDay::AlwaysAbove { transit } => SolarDay::AlwaysAbove {
                transit: to_jd(transit.rem_euclid(24.0)),
            },
            SolarDay::AlwaysBelow { transit } => SolarDay::AlwaysBelow {
                transit: to_jd(transit.rem_euclid(24.0)),
            },
        })
    }

    fn solar_equatorial(&self, jd: f64) -> EquatorialPosition {
        let (lambda, _) = self.solar_apparent_longitude(jd);
        ecliptic_to_equatorial(lambda, 0.0, apparent_obliquity(centuries(jd)))
    }

    fn solar_geometric(&self, jd: f64) -> GeometricPosition {
        let t = centuries(jd);

        let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
        let m = 357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t;
        let e = 0.016_708_634 - 0.000_042_037 * t - 0.000_000_126_7 * t * t;

        let center = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * sin_deg(m)
            + (0.019_993 - 0.000_101 * t) * sin_deg(2.0 * m)
            + 0.000_289 * sin_deg(3.0 * m);

        let true_anomaly = m + center;
        let r = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * cos_deg(true_anomaly));

        GeometricPosition {
            l: normalize(l0 + center),
            b: 0.0,
            r,
        }
    }

    fn solar_horizontal(
        &self,
        jd: f64,
        observer: &ObserverPosition,
    ) -> Result<HorizontalPosition, EphemerisError> {
        check_inputs(jd, observer)?;
        let at = datetime_from_julian_day(jd).ok_or(EphemerisError::OutOfRange(jd))?;

        let position = spa::solar_position(
            at,
            observer.latitude,
            observer.longitude,
            0.0,
            delta_t(&calendar(jd))?,
            Some(RefractionCorrection::new(PRESSURE_HPA, TEMPERATURE_C).map_err(solar_error)?),
        )
        .map_err(solar_error)?;

        // SPA azimuth runs eastward from north
        Ok(HorizontalPosition {
            alt: position.elevation_angle(),
            az: normalize(position.azimuth() - 180.0),
        })
    }

    fn horizontal(
        &self,
        equatorial: &EquatorialPosition,
        observer: &ObserverPosition,
        jd: f64,
    ) -> HorizontalPosition {
        let hour_angle = normalize(sidereal_time(jd) + observer.longitude - equatorial.ra);
        let alt = altitude(observer.latitude, equatorial.dec, hour_angle);
        let az = sin_deg(hour_angle).atan2(
            cos_deg(hour_angle) * sin_deg(observer.latitude)
                - sin_deg(equatorial.dec) / cos_deg(equatorial.dec) * cos_deg(observer.latitude),
        );

        HorizontalPosition {
            alt,
            az: normalize(az.to_degrees()),
        }
    }

    fn lunar_phase(&self, jd: f64) -> f64 {
        let moon = self.lunar_ecliptic(jd);
        let (sun_lambda, sun_distance_au) = self.solar_apparent_longitude(jd);
        let sun_distance = sun_distance_au * AU_KM;

        let cos_elongation = (cos_deg(moon.beta) * cos_deg(moon.lambda - sun_lambda)).clamp(-1.0, 1.0);
        let elongation = cos_elongation.acos();

        (sun_distance * elongation.sin())
            .atan2(moon.distance - sun_distance * elongation.cos())
            .to_degrees()
    }

    fn lunar_equatorial(&self, jd: f64) -> EquatorialPosition {
        let moon = self.lunar_ecliptic(jd);
        ecliptic_to_equatorial(moon.lambda, moon.beta, apparent_obliquity(centuries(jd)))
    }
}
