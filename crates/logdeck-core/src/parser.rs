//! Row parser: raw timestamp text + raw message text -> [`LogRecord`].
//!
//! Message text is either pure JSON (`{...}`) or a free-form prefix followed
//! by a dash delimiter and the JSON document (`"<prefix> - {...}"`).
//! Anything that does not yield a JSON object is rejected so the caller can
//! skip the row without aborting its batch.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde_json::Value;

use crate::error::RowRejection;
use crate::fingerprint::content_key;
use crate::record::{string_field, LogLevel, LogRecord, RecordId, RecordMetadata};

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
];

const OFFSET_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Payload keys checked, in order, for a content-bearing identifier.
const PAYLOAD_ID_KEYS: [&str; 2] = ["id", "eventId"];

pub fn parse_row(
    raw_timestamp: Option<&str>,
    raw_message: Option<&str>,
) -> Result<LogRecord, RowRejection> {
    let timestamp_text = raw_timestamp
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(RowRejection::MissingTimestamp)?;
    let message_text = raw_message
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(RowRejection::MissingMessage)?;

    let json_text = locate_json_payload(message_text).ok_or(RowRejection::NoJsonPayload)?;
    // The located text opens with `{`, so anything that parses is an object.
    let payload: Value = serde_json::from_str(json_text)
        .map_err(|err| RowRejection::InvalidJson(err.to_string()))?;

    let (timestamp, display_time) = parse_timestamp(timestamp_text)?;

    let payload_id = PAYLOAD_ID_KEYS
        .iter()
        .find_map(|key| string_field(&payload, key));
    let level = string_field(&payload, "level")
        .map(|raw| LogLevel::parse(&raw))
        .unwrap_or_default();
    let message = string_field(&payload, "msg")
        .or_else(|| string_field(&payload, "message"))
        .unwrap_or_default();
    let structured_payload = payload.get("data").filter(|data| !data.is_null()).cloned();

    Ok(LogRecord {
        id: RecordId::generate(),
        timestamp,
        display_time,
        level,
        message,
        structured_payload,
        metadata: RecordMetadata::from_payload(payload.get("meta")),
        content_key: content_key(payload_id.as_deref(), timestamp_text, json_text),
        is_detail_expanded: false,
    })
}

/// Locate the JSON document inside a message.
///
/// Pure JSON short-circuits the prefix search. Otherwise the first `-`
/// whose remainder (after whitespace) opens an object marks the start.
#[must_use]
pub fn locate_json_payload(message: &str) -> Option<&str> {
    let trimmed = message.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }
    trimmed.match_indices('-').find_map(|(index, _)| {
        let rest = trimmed[index + 1..].trim_start();
        rest.starts_with('{').then_some(rest)
    })
}

/// Locale-naive parse. Offset forms keep their written wall clock for the
/// display time; naive forms are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<(DateTime<Utc>, String), RowRejection> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok((parsed.with_timezone(&Utc), clock_label(&parsed.naive_local())));
    }
    for format in OFFSET_TIMESTAMP_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Ok((parsed.with_timezone(&Utc), clock_label(&parsed.naive_local())));
        }
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok((Utc.from_utc_datetime(&naive), clock_label(&naive)));
        }
    }

    Err(RowRejection::InvalidTimestamp(raw.to_string()))
}

fn clock_label(time: &NaiveDateTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}
