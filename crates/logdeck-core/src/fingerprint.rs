//! Opaque fingerprints for rows and filter state.
//!
//! Fingerprints are compared for equality only; they carry no ordering.

use std::fmt;

use sha2::{Digest, Sha256};

/// Fingerprint of one row's visible content. Empty means unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RowFingerprint(String);

impl RowFingerprint {
    /// Fingerprint of a row's raw timestamp and message text. Absent parts
    /// hash as empty so a half-rendered row still gets a stable value.
    #[must_use]
    pub fn of_row(timestamp_text: Option<&str>, message_text: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(timestamp_text.unwrap_or("").trim().as_bytes());
        hasher.update([0x1f]);
        hasher.update(message_text.unwrap_or("").trim().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell rows apart in logs.
        let short = self.0.get(..12).unwrap_or(&self.0);
        f.write_str(short)
    }
}

/// Fingerprint of what the user is looking at: search text, selected time
/// range and active timezone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilterFingerprint(String);

impl FilterFingerprint {
    #[must_use]
    pub fn from_parts(search: &str, time_range: &str, timezone: &str) -> Self {
        Self(format!(
            "{}\u{1f}{}\u{1f}{}",
            search.trim(),
            time_range.trim(),
            timezone.trim()
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace('\u{1f}', " | "))
    }
}

/// Dedup key for a parsed row: the payload's own identifier when it has
/// one, otherwise a digest of the raw timestamp and JSON text.
#[must_use]
pub fn content_key(payload_id: Option<&str>, timestamp_text: &str, json_text: &str) -> String {
    if let Some(id) = payload_id.map(str::trim).filter(|id| !id.is_empty()) {
        return format!("id:{id}");
    }
    let mut hasher = Sha256::new();
    hasher.update(timestamp_text.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(json_text.trim().as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
