//! Cache manager for persisting ephemeris documents to disk
//!
//! Provides a `CacheManager` that stores rendered documents as files and
//! judges freshness from their modification time alone. Artifacts are never
//! edited in place: each store writes a complete temporary file and renames
//! it over the previous artifact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use super::CacheKey;

/// Errors that can occur while reading or writing artifacts
#[derive(Debug, Error)]
pub enum CacheError {
    /// The directory holding the artifact could not be created
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The artifact could not be written or moved into place
    #[error("Failed to write cache artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The artifact exists but its metadata could not be read
    #[error("Failed to inspect cache artifact {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A fresh artifact could not be read
    #[error("Failed to read cache artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An artifact that was just written could not be read back
    #[error("Cache artifact {path} unreadable right after writing: {source}")]
    Reopen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the bytes of an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Served from an existing fresh file
    Cache,
    /// Built and written during this request
    Built,
}

/// A persisted document and its file metadata
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// Modification time of the file the bytes were read from
    pub modified: SystemTime,
    pub source: ArtifactSource,
}

/// Outcome of a cache lookup
#[derive(Debug)]
pub enum Lookup {
    Hit(Artifact),
    Miss,
}

/// Manages reading and writing artifacts on disk
///
/// Artifacts live under `<cache_dir>/<fingerprint>/`. An artifact is fresh
/// while `now - modified <= max_age`; a `max_age` of zero disables caching.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where artifacts are stored
    cache_dir: PathBuf,
    /// How long an artifact stays fresh
    max_age: Duration,
}

impl CacheManager {
    /// XDG-compliant default cache directory (`~/.cache/almanac` on Linux)
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home
    /// directory).
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "almanac")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    /// Creates a CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf, max_age: Duration) -> Self {
        Self { cache_dir, max_age }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns the path of the artifact for the given key
    pub fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.relative_path())
    }

    /// Looks up a fresh artifact for `key` as of `now`
    ///
    /// A missing or stale file is a miss. The file's modification time is
    /// only read, never touched. A modification time later than `now` counts
    /// as age zero.
    pub fn lookup(&self, key: &CacheKey, now: SystemTime) -> Result<Lookup, CacheError> {
        if self.max_age.is_zero() {
            return Ok(Lookup::Miss);
        }

        let path = self.cache_path(key);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Cache miss: no artifact");
                return Ok(Lookup::Miss);
            }
            Err(source) => return Err(CacheError::Stat { path, source }),
        };

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(source) => return Err(CacheError::Stat { path, source }),
        };

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > self.max_age {
            debug!(path = %path.display(), age_secs = age.as_secs(), "Cache miss: stale artifact");
            return Ok(Lookup::Miss);
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Lookup::Miss),
            Err(source) => return Err(CacheError::Read { path, source }),
        };

        debug!(path = %path.display(), age_secs = age.as_secs(), "Cache hit");
        Ok(Lookup::Hit(Artifact {
            path,
            bytes,
            modified,
            source: ArtifactSource::Cache,
        }))
    }

    /// Writes `document` as the artifact for `key`, replacing any previous one
    ///
    /// The content goes to a temporary file in the destination directory which
    /// is then renamed over the artifact, so readers only ever see complete
    /// documents. The artifact is reopened afterwards and the bytes read back
    /// are returned.
    pub fn store(&self, key: &CacheKey, document: &[u8]) -> Result<Artifact, CacheError> {
        let path = self.cache_path(key);
        let dir = path.parent().unwrap_or(&self.cache_dir).to_path_buf();

        fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let write_error = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&dir).map_err(write_error)?;
        temp.write_all(document).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&path).map_err(|e| write_error(e.error))?;

        let reopen_error = |source| CacheError::Reopen {
            path: path.clone(),
            source,
        };
        let bytes = fs::read(&path).map_err(reopen_error)?;
        let modified = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .map_err(reopen_error)?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored cache artifact");
        Ok(Artifact {
            path,
            bytes,
            modified,
            source: ArtifactSource::Built,
        })
    }

    /// Serves the fresh artifact for `key`, building and storing one on a miss
    pub fn fetch_or_build<E, F>(&self, key: &CacheKey, now: SystemTime, build: F) -> Result<Artifact, E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
        E: From<CacheError>,
    {
        if let Lookup::Hit(artifact) = self.lookup(key, now)? {
            return Ok(artifact);
        }

        let document = build()?;
        Ok(self.store(key, &document)?)
    }
}
