//! Command-line interface parsing for the almanac
//!
//! This module handles parsing of CLI arguments using clap. Every option can
//! also come from an environment variable, which is how a CGI deployment
//! configures the responder.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::CacheManager;
use crate::data::{ObserverPosition, DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use crate::window::WindowPolicy;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified window policy is not recognized
    #[error("Invalid window policy: '{0}'. Valid policies: yearly, monthly")]
    InvalidWindow(String),

    /// The default location is outside the valid coordinate ranges
    #[error("Invalid default location: lat {lat}, lng {lng}")]
    InvalidDefaultLocation { lat: f64, lng: f64 },
}

/// Almanac - sunrise, sunset, solar and lunar data as JSON
#[derive(Parser, Debug)]
#[command(name = "almanac")]
#[command(about = "Serves cached sun and moon data for a location as JSON (CGI)")]
#[command(version)]
pub struct Cli {
    /// Latitude used when the request carries no usable location
    #[arg(
        long,
        env = "ALMANAC_DEFAULT_LAT",
        default_value_t = DEFAULT_LATITUDE,
        allow_negative_numbers = true
    )]
    pub lat: f64,

    /// Longitude (east-positive) used when the request carries no usable location
    #[arg(
        long,
        env = "ALMANAC_DEFAULT_LNG",
        default_value_t = DEFAULT_LONGITUDE,
        allow_negative_numbers = true
    )]
    pub lng: f64,

    /// Span of days to publish
    ///
    /// Valid policies: yearly, monthly
    #[arg(long, env = "ALMANAC_WINDOW", default_value = "yearly", value_name = "POLICY")]
    pub window: String,

    /// Seconds a cached document stays fresh (0 rebuilds on every request)
    #[arg(long, env = "ALMANAC_MAX_AGE", default_value_t = 300, value_name = "SECS")]
    pub max_age: u64,

    /// Directory holding cached documents (defaults to the XDG cache directory)
    #[arg(long, env = "ALMANAC_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Build every response from scratch without touching the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Query string to answer instead of $QUERY_STRING
    ///
    /// Example:
    ///   almanac --query 'lat=49.27&lng=-123.15'
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,
}

/// Configuration derived from CLI arguments and environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Position answered when the request has none
    pub default_position: ObserverPosition,
    /// Span of days in each document
    pub window: WindowPolicy,
    /// How long a cached document stays fresh
    pub max_age: Duration,
    /// Cache root; `None` disables caching
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_position: ObserverPosition::default(),
            window: WindowPolicy::default(),
            max_age: Duration::from_secs(300),
            cache_dir: None,
        }
    }
}

/// Parses a window policy argument.
///
/// # Returns
/// * `Ok(WindowPolicy)` if the string names a policy
/// * `Err(CliError::InvalidWindow)` if it doesn't
pub fn parse_window_arg(s: &str) -> Result<WindowPolicy, CliError> {
    WindowPolicy::from_name(s).ok_or_else(|| CliError::InvalidWindow(s.to_string()))
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// Without `--cache-dir` the XDG cache directory is used, falling back
    /// to the system temporary directory when there is no home directory
    /// (common for CGI processes).
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let window = parse_window_arg(&cli.window)?;

        let default_position = ObserverPosition::new(cli.lat, cli.lng);
        if !default_position.is_valid() {
            return Err(CliError::InvalidDefaultLocation {
                lat: cli.lat,
                lng: cli.lng,
            });
        }

        let cache_dir = if cli.no_cache {
            None
        } else {
            Some(
                cli.cache_dir
                    .clone()
                    .or_else(CacheManager::default_dir)
                    .unwrap_or_else(|| std::env::temp_dir().join("almanac")),
            )
        };

        Ok(Config {
            default_position,
            window,
            max_age: Duration::from_secs(cli.max_age),
            cache_dir,
        })
    }
}
