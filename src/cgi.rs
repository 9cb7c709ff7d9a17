//! CGI transport adapter
//!
//! Parses the query string, emits the response headers and hands the body to
//! the response writer.

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::ephemeris::Ephemeris;
use crate::response::write_payload;
use crate::service::{AlmanacService, ServiceError};

/// Content type of every successful response
pub const CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Splits a query string into decoded key/value pairs
///
/// Pairs are separated by `&` (or `;`); a key without `=` gets an empty
/// value. When a key repeats, the last occurrence wins.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split(['&', ';'])
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

/// Decodes `+` and `%XX` escapes; malformed escapes are kept as-is
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 2;
                    }
                    None => decoded.push(b'%'),
                }
            }
            byte => decoded.push(byte),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Writes the headers of a successful response
pub fn write_success_headers<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "Content-Type: {}\r\n\r\n", CONTENT_TYPE)
}

/// Writes the headers of a failed response; the body stays empty
pub fn write_failure_headers<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "Status: 500 Internal Server Error\r\n\r\n")
}

/// Answers one CGI request
///
/// Nothing is written unless the whole payload is ready, so a failure never
/// leaves a partial document on the output.
pub fn handle_request<E: Ephemeris, W: Write>(
    service: &AlmanacService<E>,
    query: &str,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<(), ServiceError> {
    let params = parse_query(query);
    let payload = service.respond(&params, now)?;

    write_success_headers(out)?;
    write_payload(out, &payload)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Config;
    use crate::data::DayRecord;
    use crate::window::WindowPolicy;
    use chrono::TimeZone;

    #[test]
    fn test_parse_query_basic_pairs() {
        let params = parse_query("lat=49.27&lng=-123.15");
        assert_eq!(params.get("lat").map(String::as_str), Some("49.27"));
        assert_eq!(params.get("lng").map(String::as_str), Some("-123.15"));
    }

    #[test]
    fn test_parse_query_empty_and_bare_keys() {
        assert!(parse_query("").is_empty());

        let params = parse_query("&&flag&lat=");
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("lat").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_query_last_duplicate_wins() {
        let params = parse_query("lat=1&lat=2");
        assert_eq!(params.get("lat").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_query_decodes_escapes() {
        let params = parse_query("lat=%2D33.86&lng=151%2E21&name=a+b&bad=%zz&tail=5%");
        assert_eq!(params.get("lat").map(String::as_str), Some("-33.86"));
        assert_eq!(params.get("lng").map(String::as_str), Some("151.21"));
        assert_eq!(params.get("name").map(String::as_str), Some("a b"));
        assert_eq!(params.get("bad").map(String::as_str), Some("%zz"));
        assert_eq!(params.get("tail").map(String::as_str), Some("5%"));
    }

    #[test]
    fn test_handle_request_writes_headers_then_json() {
        let config = Config {
            window: WindowPolicy::Monthly,
            cache_dir: None,
            ..Config::default()
        };
        let service = AlmanacService::new(config);
        let now = Utc.with_ymd_and_hms(2011, 6, 15, 12, 0, 0).unwrap();

        let mut out = Vec::new();
        handle_request(&service, "", now, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let (headers, body) = text.split_once("\r\n\r\n").unwrap();
        assert_eq!(headers, "Content-Type: application/json;charset=utf-8");

        let records: Vec<DayRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(records.len(), 91);
    }

    #[test]
    fn test_failure_headers() {
        let mut out = Vec::new();
        write_failure_headers(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Status: 500"));
    }
}
