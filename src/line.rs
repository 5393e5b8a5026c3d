// src/line.rs
use chrono::NaiveDateTime;

/// Syslog timestamp layout, with the year prepended by the caller.
const TIMESTAMP_FORMAT: &str = "%Y %b %e %H:%M:%S";

/// One auth.log line split into its syslog header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub timestamp_text: String,
    pub hostname: &'a str,
    pub unit: &'a str,
    pub message: &'a str,
}

#[derive(Debug, thiserror::Error)]
#[error("cannot parse time {text:?}: {source}")]
pub struct LineError {
    pub text: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Split `Mon D HH:MM:SS host unit: message` into its parts.
///
/// Lines without a `": "` separator or without exactly five header tokens
/// are not syslog records we understand and yield `None`.
pub fn split_line(line: &str) -> Option<RawLine<'_>> {
    let (meta, message) = line.split_once(": ")?;

    let fields: Vec<&str> = meta.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }

    Some(RawLine {
        timestamp_text: fields[..3].join(" "),
        hostname: fields[3],
        unit: fields[4],
        message,
    })
}

/// Parse a year-less syslog timestamp, placing it in `year`.
pub fn parse_timestamp(text: &str, year: i32) -> Result<NaiveDateTime, LineError> {
    NaiveDateTime::parse_from_str(&format!("{year} {text}"), TIMESTAMP_FORMAT)
        .map_err(|source| LineError { text: text.to_string(), source })
}
