//! Tracing subscriber setup for the `logdeck` binary.
//!
//! Log lines go to stderr so command output on stdout stays parseable.
//! `RUST_LOG` wins over the configured level when set.

use logdeck_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.trim()))
}

/// Install the global subscriber. Returns false when one is already set.
pub fn init(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = if config.format.trim().eq_ignore_ascii_case("compact") {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::build_filter;
    use logdeck_core::LoggingConfig;

    #[test]
    fn configured_level_becomes_the_filter() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = build_filter(&LoggingConfig {
            level: "debug".to_string(),
            format: "compact".to_string(),
        });
        assert_eq!(filter.to_string(), "debug");
    }
}
