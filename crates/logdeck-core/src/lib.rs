//! logdeck-core: record model, row parsing, identity colors and
//! configuration shared by the reconciliation engine and the CLI.
//!
//! Nothing in this crate keeps state across observations except the
//! per-session [`colors::UsernameColorTable`]; the stateful pieces live in
//! `logdeck-reconcile`.

pub mod colors;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod record;

pub use colors::{identity_color, UsernameColorTable, DEFAULT_IDENTITY_COLOR};
pub use config::{load_config, LoggingConfig, OverlayConfig, ReconcileConfig};
pub use error::{ConfigError, RowRejection};
pub use fingerprint::{content_key, FilterFingerprint, RowFingerprint};
pub use parser::{locate_json_payload, parse_row};
pub use record::{LogLabel, LogLevel, LogRecord, RecordId, RecordMetadata};

/// Crate identity label.
pub fn crate_label() -> &'static str {
    "logdeck-core"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_label_is_stable() {
        assert_eq!(crate_label(), "logdeck-core");
    }

    #[test]
    fn modules_are_accessible() {
        let _ = LogLevel::Info;
        let _ = LogLabel::Generic;
        let _ = OverlayConfig::default();
        let _ = RowRejection::MissingMessage;
        let _ = FilterFingerprint::default();
        let _ = UsernameColorTable::new();
    }
}
