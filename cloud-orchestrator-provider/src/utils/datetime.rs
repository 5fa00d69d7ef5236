//! Serde helpers for optional vendor timestamps.
//!
//! Output is always RFC 3339. Input may be RFC 3339 (any offset), a naive
//! `YYYY-MM-DD HH:MM:SS` taken as UTC, or a Unix epoch in seconds or milliseconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

/// Epoch values above this are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[allow(clippy::ref_option)]
pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Epoch(i64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => parse_text(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp '{s}'"))),
        Some(Raw::Epoch(n)) => from_epoch(n)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("epoch {n} out of range"))),
    }
}

fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}
