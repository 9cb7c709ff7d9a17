//! Response body emission
//!
//! The body is always a JSON array of day records in ascending day order.
//! A cached artifact is streamed byte for byte; a freshly built document is
//! serialized directly to the output.

use std::io::{self, Write};

use crate::cache::Artifact;
use crate::data::DayRecord;

/// What a request is answered with
#[derive(Debug)]
pub enum Payload {
    /// A stored artifact, fresh from the cache or just written
    Artifact(Artifact),
    /// Records built for a request with caching disabled
    Document(Vec<DayRecord>),
}

/// Renders records as the bytes stored in an artifact
pub fn render_document(records: &[DayRecord]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(records)
}

/// Writes records as a JSON array
pub fn write_document<W: Write>(out: &mut W, records: &[DayRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, records)
}

/// Streams an artifact's bytes unchanged
pub fn write_artifact<W: Write>(out: &mut W, artifact: &Artifact) -> io::Result<()> {
    out.write_all(&artifact.bytes)
}

/// Writes whichever body the payload carries
pub fn write_payload<W: Write>(out: &mut W, payload: &Payload) -> io::Result<()> {
    match payload {
        Payload::Artifact(artifact) => write_artifact(out, artifact),
        Payload::Document(records) => write_document(out, records).map_err(io::Error::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ArtifactSource;
    use crate::data::{CalendarInstant, MoonRecord, SunRecord, TransitRecord};
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn record(day: u32) -> DayRecord {
        let now = CalendarInstant::date(2011, 6, day).with_time(12, 0, 0.0);
        DayRecord {
            now,
            sun: SunRecord {
                alt: 50.0,
                rising: false,
                rise: Some(now.with_time(0, 10, 0.0)),
                transit: TransitRecord {
                    at: now.with_time(10, 12, 0.0),
                    alt: 52.0,
                },
                set: Some(now.with_time(20, 5, 0.0)),
            },
            moon: MoonRecord {
                phase: 90.0,
                waxing: true,
                alt: 5.0,
                rising: true,
            },
        }
    }

    #[test]
    fn test_document_is_ordered_array_without_trailing_comma() {
        let records = vec![record(1), record(2), record(3)];
        let bytes = render_document(&records).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert!(text.trim_start().starts_with('['));
        assert!(text.trim_end().ends_with(']'));
        assert!(!text.replace(char::is_whitespace, "").contains(",]"));

        let parsed: Vec<DayRecord> = serde_json::from_slice(&bytes).unwrap();
        let days: Vec<u32> = parsed.iter().map(|r| r.now.day).collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_document_is_empty_array() {
        let bytes = render_document(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().trim(), "[]");
    }

    #[test]
    fn test_artifact_streamed_byte_for_byte() {
        let artifact = Artifact {
            path: PathBuf::from("x.json"),
            bytes: b"[ {\"now\": 1} ]".to_vec(),
            modified: SystemTime::now(),
            source: ArtifactSource::Cache,
        };

        let mut out = Vec::new();
        write_payload(&mut out, &Payload::Artifact(artifact.clone())).unwrap();
        assert_eq!(out, artifact.bytes);
    }

    #[test]
    fn test_fresh_document_matches_rendered_artifact() {
        let records = vec![record(14), record(15)];

        let mut streamed = Vec::new();
        write_payload(&mut streamed, &Payload::Document(records.clone())).unwrap();

        assert_eq!(streamed, render_document(&records).unwrap());
    }
}
