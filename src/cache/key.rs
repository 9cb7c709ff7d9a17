//! Cache keys
//!
//! A key is the build fingerprint plus the observer position quantized to a
//! fixed number of decimals, so floating-point noise in the request never
//! fragments the cache.

use std::path::PathBuf;

use crate::data::ObserverPosition;
use crate::window::WindowPolicy;

/// Decimal places kept for latitude and longitude (about a metre)
pub const COORDINATE_DECIMALS: usize = 5;

/// Bumped whenever window planning, day-record logic or the engine changes output
pub const COMPUTATION_REVISION: u32 = 2;

/// Version tag separating artifacts written by different builds and policies
pub fn build_fingerprint(policy: WindowPolicy) -> String {
    format!(
        "{}-r{}-{}",
        env!("CARGO_PKG_VERSION"),
        COMPUTATION_REVISION,
        policy.tag()
    )
}

/// Identifies one cache artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    fingerprint: String,
    latitude: String,
    longitude: String,
}

impl CacheKey {
    pub fn new(fingerprint: &str, position: &ObserverPosition) -> Self {
        Self {
            fingerprint: sanitize(fingerprint),
            latitude: quantize(position.latitude),
            longitude: quantize(position.longitude),
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Path of the artifact relative to the cache root:
    /// `<fingerprint>/<lat>_<lng>.json`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.fingerprint).join(format!("{}_{}.json", self.latitude, self.longitude))
    }
}

/// Fixed-point rendering of a coordinate; negative zero prints as zero
fn quantize(value: f64) -> String {
    let scale = 10f64.powi(COORDINATE_DECIMALS as i32);
    let rounded = (value * scale).round() / scale;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", COORDINATE_DECIMALS, rounded)
}

/// Keeps a fingerprint usable as a single directory name
fn sanitize(fingerprint: &str) -> String {
    let cleaned: String = fingerprint
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
