//! Error taxonomy.
//!
//! Row rejections are expected and recoverable: the caller skips the row
//! and keeps the batch. Only configuration errors ever reach a user.

use std::path::PathBuf;

/// Why a single row could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowRejection {
    #[error("row has no timestamp text")]
    MissingTimestamp,
    #[error("row has no message text")]
    MissingMessage,
    #[error("message carries no JSON payload")]
    NoJsonPayload,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("unrecognized timestamp {0:?}")]
    InvalidTimestamp(String),
}

impl RowRejection {
    /// Short stable tag used in logs and counters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingTimestamp => "missing_timestamp",
            Self::MissingMessage => "missing_message",
            Self::NoJsonPayload => "no_json_payload",
            Self::InvalidJson(_) => "invalid_json",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
        }
    }

    /// The host had not finished rendering the row; a later read of the
    /// same row may succeed.
    #[must_use]
    pub fn is_unrendered(&self) -> bool {
        matches!(self, Self::MissingTimestamp | Self::MissingMessage)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}
