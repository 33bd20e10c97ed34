//! Structured log record model.
//!
//! A [`LogRecord`] is what the overlay renders in place of one vendor row.
//! Its `id` is synthetic and local to the mounted session; nothing about it
//! is derived from row content.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Synthetic, session-local record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier. Never reused within a process.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Severity of a record. Unknown values fall back to [`LogLevel::Info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "warn" | "warning" => Self::Warn,
            "error" | "err" | "fatal" | "critical" => Self::Error,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Emitting surface recorded in the payload metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLabel {
    Gui,
    Sdk,
    Api,
    #[default]
    Generic,
}

impl LogLabel {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GUI" => Self::Gui,
            "SDK" => Self::Sdk,
            "API" => Self::Api,
            _ => Self::Generic,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gui => "GUI",
            Self::Sdk => "SDK",
            Self::Api => "API",
            Self::Generic => "GENERIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecordMetadata {
    pub service: String,
    pub app_version: String,
    pub view: String,
    pub session_id: String,
    pub device_id: String,
    pub label: LogLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RecordMetadata {
    /// Build metadata from the payload's `meta` object. Missing string
    /// fields become empty; blank optional fields become `None`.
    #[must_use]
    pub fn from_payload(meta: Option<&Value>) -> Self {
        let Some(meta) = meta else {
            return Self::default();
        };
        Self {
            service: string_field(meta, "service").unwrap_or_default(),
            app_version: string_field(meta, "appVersion").unwrap_or_default(),
            view: string_field(meta, "view").unwrap_or_default(),
            session_id: string_field(meta, "sessionId").unwrap_or_default(),
            device_id: string_field(meta, "deviceId").unwrap_or_default(),
            label: string_field(meta, "label")
                .map(|raw| LogLabel::parse(&raw))
                .unwrap_or_default(),
            username: string_field(meta, "username"),
            correlation_id: string_field(meta, "correlationId"),
            action: string_field(meta, "action"),
            target: string_field(meta, "target"),
        }
    }
}

/// Read a string-ish field. Numbers and booleans are stringified; blank
/// strings, nulls and nested values are treated as absent.
pub(crate) fn string_field(object: &Value, key: &str) -> Option<String> {
    let value = object.get(key)?;
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub display_time: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_payload: Option<Value>,
    pub metadata: RecordMetadata,
    #[serde(skip)]
    pub content_key: String,
    pub is_detail_expanded: bool,
}

impl LogRecord {
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.metadata.username.as_deref()
    }

    #[must_use]
    pub fn has_structured_payload(&self) -> bool {
        match &self.structured_payload {
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LogLabel, LogLevel, RecordId, RecordMetadata};
    use serde_json::json;

    #[test]
    fn level_parse_accepts_aliases_and_defaults_to_info() {
        assert_eq!(LogLevel::parse("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse(" warning "), LogLevel::Warn);
        assert_eq!(LogLevel::parse("fatal"), LogLevel::Error);
        assert_eq!(LogLevel::parse("debug"), LogLevel::Info);
        assert_eq!(LogLevel::parse(""), LogLevel::Info);
    }

    #[test]
    fn label_parse_falls_back_to_generic() {
        assert_eq!(LogLabel::parse("gui"), LogLabel::Gui);
        assert_eq!(LogLabel::parse("API"), LogLabel::Api);
        assert_eq!(LogLabel::parse("mobile"), LogLabel::Generic);
        assert_eq!(LogLabel::Sdk.label(), "SDK");
    }

    #[test]
    fn metadata_reads_camel_case_fields_and_blank_optionals() {
        let meta = json!({
            "service": "checkout",
            "appVersion": "4.2.0",
            "view": "cart",
            "sessionId": "s-1",
            "deviceId": 77,
            "label": "SDK",
            "username": "  ",
            "correlationId": "c-9"
        });
        let parsed = RecordMetadata::from_payload(Some(&meta));
        assert_eq!(parsed.service, "checkout");
        assert_eq!(parsed.app_version, "4.2.0");
        assert_eq!(parsed.device_id, "77");
        assert_eq!(parsed.label, LogLabel::Sdk);
        assert_eq!(parsed.username, None);
        assert_eq!(parsed.correlation_id.as_deref(), Some("c-9"));
        assert_eq!(parsed.action, None);
    }

    #[test]
    fn missing_metadata_is_default() {
        assert_eq!(RecordMetadata::from_payload(None), RecordMetadata::default());
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids = (0..64).map(|_| RecordId::generate()).collect::<Vec<_>>();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }
}
