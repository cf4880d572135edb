//! Turns decoded records into the newline-delimited bulk wire format.
//!
//! Two lines per record: the action descriptor, then the document itself,
//! with the document's timestamp normalized under `@timestamp` first. The
//! whole payload carries a trailing newline; the bulk endpoint rejects
//! bodies without one.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

/// Timestamp fields recognized on incoming records, in precedence order.
const TIMESTAMP_FIELDS: [&str; 3] = ["@timestamp", "timestamp", "time"];

/// Renders the full bulk payload for one file's records.
///
/// Every record gets the same action line; the index and type are fixed per
/// job. Records are mutated in place: the resolved timestamp is written
/// back under `@timestamp` while any alternate field it came from is left
/// untouched.
pub fn build_bulk_payload(
    mut records: Vec<Map<String, Value>>,
    index: &str,
    doc_type: &str,
) -> Result<String> {
    let action = serde_json::to_string(&serde_json::json!({
        "index": {"_index": index, "_type": doc_type}
    }))
    .context("failed to serialize the bulk action line")?;

    let mut payload = String::with_capacity(records.len() * (action.len() + 64));
    for record in records.iter_mut() {
        normalize_timestamp(record)?;
        payload.push_str(&action);
        payload.push('\n');
        payload.push_str(
            &serde_json::to_string(record).context("failed to serialize a record")?,
        );
        payload.push('\n');
    }
    Ok(payload)
}

/// Resolves the record's timestamp and rewrites it canonically.
fn normalize_timestamp(record: &mut Map<String, Value>) -> Result<()> {
    let raw = match TIMESTAMP_FIELDS.iter().find_map(|field| record.get(*field)) {
        Some(value) => value,
        None => bail!("record has no @timestamp, timestamp, or time field"),
    };
    let parsed = match parse_timestamp(raw) {
        Some(timestamp) => timestamp,
        None => bail!("unrecognized timestamp value {raw}"),
    };
    record.insert(
        "@timestamp".to_string(),
        Value::String(parsed.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    Ok(())
}

/// Accepts RFC 3339 strings, bare `YYYY-MM-DD HH:MM:SS` datetimes (read as
/// UTC), and numeric epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .ok()
            .or_else(|| parse_naive(text, "%Y-%m-%d %H:%M:%S%.f"))
            .or_else(|| parse_naive(text, "%Y-%m-%dT%H:%M:%S%.f")),
        Value::Number(number) => {
            let millis = number.as_i64().or_else(|| number.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_naive(text: &str, format: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, format)
        .map(|naive| naive.and_utc())
        .ok()
}
