//! Overlay configuration.
//!
//! Precedence: defaults < config file (explicit path => hard error if
//! unreadable) < `LOGDECK_LOG_LEVEL` environment override.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "LOGDECK_CONFIG";
pub const ENV_LOG_LEVEL: &str = "LOGDECK_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlayConfig {
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Rows at the head of the vendor table that are never data: the
    /// "load more" row and the overlay's own container row.
    pub leading_structural_rows: usize,
    /// Rows at the tail that are never data: the trailing "load more" row.
    pub trailing_structural_rows: usize,
    /// Services whose batches are accepted. Empty accepts every service.
    pub allowed_services: Vec<String>,
    /// Quiescence window for mutation bursts. Zero runs immediately.
    pub debounce: Duration,
    pub filter_poll_interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            leading_structural_rows: 2,
            trailing_structural_rows: 1,
            allowed_services: Vec::new(),
            debounce: Duration::ZERO,
            filter_poll_interval: Duration::from_millis(500),
        }
    }
}

impl ReconcileConfig {
    #[must_use]
    pub fn accepts_service(&self, service: &str) -> bool {
        service_allowed(&self.allowed_services, service)
    }
}

/// Case-insensitive allow-list check. An empty list allows everything.
#[must_use]
pub fn service_allowed(allowed_services: &[String], service: &str) -> bool {
    allowed_services.is_empty()
        || allowed_services
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(service.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "console".to_string(),
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.filter_poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "reconcile.filter_poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self
            .reconcile
            .allowed_services
            .iter()
            .any(|service| service.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "reconcile.allowed_services must not contain blank entries".into(),
            ));
        }
        match self.logging.level.to_lowercase().trim() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "logging.level must be one of trace, debug, info, warn, error".into(),
                ))
            }
        }
        match self.logging.format.to_lowercase().trim() {
            "console" | "compact" => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "logging.format must be one of console, compact".into(),
                ))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    #[serde(default)]
    reconcile: PartialReconcileConfig,
    #[serde(default)]
    logging: PartialLoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
struct PartialReconcileConfig {
    #[serde(default)]
    leading_structural_rows: Option<usize>,
    #[serde(default)]
    trailing_structural_rows: Option<usize>,
    #[serde(default)]
    allowed_services: Option<Vec<String>>,
    #[serde(default)]
    debounce_ms: Option<u64>,
    #[serde(default)]
    filter_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialLoggingConfig {
    #[serde(default)]
    level: String,
    #[serde(default)]
    format: String,
}

/// Load config. An explicit path (argument, then `LOGDECK_CONFIG`) must be
/// readable; the default location is optional.
pub fn load_config(
    config_file: Option<&str>,
) -> Result<(OverlayConfig, Option<PathBuf>), ConfigError> {
    let mut cfg = OverlayConfig::default();

    let explicit = config_file
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok())
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let mut used = None;
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        apply_text(&mut cfg, &path, &text)?;
        used = Some(path);
    } else if let Some(path) = default_config_path() {
        if let Ok(text) = std::fs::read_to_string(&path) {
            apply_text(&mut cfg, &path, &text)?;
            used = Some(path);
        }
    }

    if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
        if !level.trim().is_empty() {
            cfg.logging.level = level.trim().to_string();
        }
    }

    cfg.validate()?;
    Ok((cfg, used))
}

/// Parse YAML text on top of the defaults.
pub fn config_from_yaml(text: &str) -> Result<OverlayConfig, ConfigError> {
    let mut cfg = OverlayConfig::default();
    apply_text(&mut cfg, Path::new("<inline>"), text)?;
    cfg.validate()?;
    Ok(cfg)
}

fn apply_text(cfg: &mut OverlayConfig, path: &Path, text: &str) -> Result<(), ConfigError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let parsed: PartialConfig = serde_yaml::from_str(text).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    apply_partial(cfg, parsed);
    Ok(())
}

fn apply_partial(cfg: &mut OverlayConfig, partial: PartialConfig) {
    let reconcile = partial.reconcile;
    if let Some(rows) = reconcile.leading_structural_rows {
        cfg.reconcile.leading_structural_rows = rows;
    }
    if let Some(rows) = reconcile.trailing_structural_rows {
        cfg.reconcile.trailing_structural_rows = rows;
    }
    if let Some(services) = reconcile.allowed_services {
        cfg.reconcile.allowed_services = services
            .into_iter()
            .map(|service| service.trim().to_string())
            .collect();
    }
    if let Some(ms) = reconcile.debounce_ms {
        cfg.reconcile.debounce = Duration::from_millis(ms);
    }
    if let Some(ms) = reconcile.filter_poll_interval_ms {
        cfg.reconcile.filter_poll_interval = Duration::from_millis(ms);
    }
    if !partial.logging.level.trim().is_empty() {
        cfg.logging.level = partial.logging.level.trim().to_string();
    }
    if !partial.logging.format.trim().is_empty() {
        cfg.logging.format = partial.logging.format.trim().to_string();
    }
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("logdeck").join("config.yaml"));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(
                PathBuf::from(home)
                    .join(".config")
                    .join("logdeck")
                    .join("config.yaml"),
            );
        }
    }
    None
}
