//! Observer location resolution
//!
//! Turns the `lat` and `lng` request parameters into an [`ObserverPosition`].
//! Each parameter is classified as absent, well-formed or malformed. A value
//! is well-formed only if the whole text parses as a finite number inside
//! the coordinate's physical range; a numeric prefix followed by garbage is
//! malformed. The requested position is used only when both parameters are
//! well-formed, otherwise the configured default is used as a whole.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::warn;

use crate::data::ObserverPosition;

const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// State of a single coordinate parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamState {
    /// Not present, or present with an empty value
    Absent,
    /// A finite number inside the allowed range
    WellFormed(f64),
    /// Present but unusable; carries the raw text
    Malformed(String),
}

/// Classifies the parameter `name` against `range`
pub fn classify(params: &HashMap<String, String>, name: &str, range: &RangeInclusive<f64>) -> ParamState {
    let raw = match params.get(name) {
        Some(raw) => raw,
        None => return ParamState::Absent,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParamState::Absent;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && range.contains(&value) => ParamState::WellFormed(value),
        _ => ParamState::Malformed(raw.clone()),
    }
}

/// Resolves the observer position for a request
pub fn resolve(params: &HashMap<String, String>, default: ObserverPosition) -> ObserverPosition {
    let lat = classify(params, "lat", &LATITUDE_RANGE);
    let lng = classify(params, "lng", &LONGITUDE_RANGE);

    for (name, state) in [("lat", &lat), ("lng", &lng)] {
        if let ParamState::Malformed(raw) = state {
            warn!(param = name, value = %raw, "Malformed location parameter, using default location");
        }
    }

    match (lat, lng) {
        (ParamState::WellFormed(latitude), ParamState::WellFormed(longitude)) => {
            ObserverPosition::new(latitude, longitude)
        }
        _ => default,
    }
}
