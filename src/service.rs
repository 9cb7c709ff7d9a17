//! Request handling
//!
//! Ties the pieces together for one request: resolve the location, look the
//! artifact up, and on a miss plan the window, build every day record and
//! store the rendered document.

use std::collections::HashMap;
use std::io;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::builder::DayRecordBuilder;
use crate::cache::{build_fingerprint, CacheError, CacheKey, CacheManager};
use crate::cli::Config;
use crate::data::{CalendarInstant, DayRecord, ObserverPosition};
use crate::ephemeris::{AnalyticEphemeris, Ephemeris, EphemerisError};
use crate::location;
use crate::response::{render_document, Payload};

/// Errors that fail a request
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Cache directory or artifact I/O failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The ephemeris rejected its input
    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),

    /// The document could not be encoded
    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    /// The response could not be written
    #[error("Failed to write response: {0}")]
    Output(#[from] io::Error),
}

/// Answers requests for one configuration
#[derive(Debug, Clone)]
pub struct AlmanacService<E = AnalyticEphemeris> {
    config: Config,
    cache: Option<CacheManager>,
    ephemeris: E,
}

impl AlmanacService<AnalyticEphemeris> {
    /// Creates a service backed by the built-in ephemeris
    pub fn new(config: Config) -> Self {
        Self::with_ephemeris(config, AnalyticEphemeris::new())
    }
}

impl<E: Ephemeris> AlmanacService<E> {
    /// Creates a service backed by a custom ephemeris
    pub fn with_ephemeris(config: Config, ephemeris: E) -> Self {
        let cache = config
            .cache_dir
            .clone()
            .map(|dir| CacheManager::with_dir(dir, config.max_age));
        Self {
            config,
            cache,
            ephemeris,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    /// Fingerprint of artifacts written by this build and configuration
    pub fn fingerprint(&self) -> String {
        build_fingerprint(self.config.window)
    }

    /// Answers a request made at `now` with the given query parameters
    pub fn respond(&self, params: &HashMap<String, String>, now: DateTime<Utc>) -> Result<Payload, ServiceError> {
        let position = location::resolve(params, self.config.default_position);

        let cache = match &self.cache {
            Some(cache) => cache,
            None => {
                debug!("Caching disabled, building document");
                return Ok(Payload::Document(self.build_document(position, now)?));
            }
        };

        let key = CacheKey::new(&self.fingerprint(), &position);
        let artifact = cache.fetch_or_build(&key, SystemTime::from(now), || {
            let records = self.build_document(position, now)?;
            Ok::<_, ServiceError>(render_document(&records)?)
        })?;

        debug!(path = %artifact.path.display(), source = ?artifact.source, "Serving artifact");
        Ok(Payload::Artifact(artifact))
    }

    /// Builds the full document for `position` as of `now`
    pub fn build_document(&self, position: ObserverPosition, now: DateTime<Utc>) -> Result<Vec<DayRecord>, ServiceError> {
        let window = self.config.window.plan(&CalendarInstant::from(now));
        let builder = DayRecordBuilder::new(&self.ephemeris, position);
        Ok(builder.build_document(&window)?)
    }
}
