//! Almanac - sun and moon data as JSON
//!
//! A CGI program: reads the request from `$QUERY_STRING` (or `--query`) and
//! writes headers plus a JSON document to stdout. Logs go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use almanac::cgi::{handle_request, write_failure_headers};
use almanac::cli::{Cli, Config};
use almanac::data::julian_day_from_datetime;
use almanac::service::AlmanacService;

/// Sets up logging to stderr, filtered by `ALMANAC_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_env("ALMANAC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let query = cli
        .query
        .clone()
        .or_else(|| std::env::var("QUERY_STRING").ok())
        .unwrap_or_default();

    let service = AlmanacService::new(config);
    let now = Utc::now();

    match service.cache() {
        Some(cache) => debug!(
            window = ?service.config().window,
            cache_dir = %cache.cache_dir().display(),
            max_age_secs = cache.max_age().as_secs(),
            "Caching enabled"
        ),
        None => debug!(window = ?service.config().window, "Caching disabled"),
    }
    debug!(%now, jd = julian_day_from_datetime(now), query = %query, "Handling request");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match handle_request(&service, &query, now, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Request failed");
            // Success headers are only written once the payload is ready
            let _ = write_failure_headers(&mut out);
            let _ = out.flush();
            ExitCode::FAILURE
        }
    }
}
