//! Cache module for storing rendered ephemeris documents on disk
//!
//! This module keys artifacts by build fingerprint and quantized observer
//! position, judges freshness from file modification time against a
//! configurable maximum age, and replaces artifacts atomically so concurrent
//! requests for the same key never observe a partial write.

mod key;
mod manager;

pub use key::{build_fingerprint, CacheKey, COMPUTATION_REVISION, COORDINATE_DECIMALS};
pub use manager::{Artifact, ArtifactSource, CacheError, CacheManager, Lookup};
