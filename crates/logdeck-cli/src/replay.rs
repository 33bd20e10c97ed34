//! `logdeck replay`: drive the reconciliation engine from a scripted
//! sequence of table observations.
//!
//! A script is YAML (or JSON) holding a list of steps, either at the top
//! level or under `steps:`. Each step may replace the data rows and the
//! filter controls of an in-memory host, then fires one event:
//!
//! ```yaml
//! steps:
//!   - rows:
//!       - ["2024-03-05 09:00:01", 'svc - {"msg":"boot","meta":{"service":"checkout"}}']
//!   - filter: { search: "error", time_range: "1h", timezone: "UTC" }
//!     rows: []
//!     event: filter_tick
//!   - event: toggle
//!     toggle: 0
//! ```
//!
//! Structural rows are added around the scripted rows according to the
//! loaded config, so trimming runs exactly as it would against the vendor
//! table.

use std::collections::BTreeMap;
use std::io::Write;

use logdeck_core::{load_config, FilterFingerprint, LogRecord, OverlayConfig, UsernameColorTable};
use logdeck_reconcile::{
    CollectingSink, CycleOutcome, InMemoryHost, ReconciliationDriver, StaticRow,
};
use serde::{Deserialize, Serialize};
use tabwriter::TabWriter;
use tracing::{debug, info};

use crate::CommandOutput;

const HELP_TEXT: &str = "\
Replay a scripted sequence of table observations

Usage:
  logdeck replay <script> [flags]

Flags:
      --config <path>   overlay config file (YAML)
      --jsonl           one JSON object per step
  -h, --help            help for replay";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedArgs {
    script: String,
    config: Option<String>,
    jsonl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepEvent {
    #[default]
    Mutation,
    FilterTick,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub time_range: String,
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptRow {
    Pair(Option<String>, Option<String>),
    Fields {
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl From<ScriptRow> for StaticRow {
    fn from(row: ScriptRow) -> Self {
        let (timestamp, message) = match row {
            ScriptRow::Pair(timestamp, message) => (timestamp, message),
            ScriptRow::Fields { timestamp, message } => (timestamp, message),
        };
        StaticRow { timestamp, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayStep {
    #[serde(default)]
    pub filter: Option<ScriptFilter>,
    /// Full data-row collection after this step; `None` keeps the rows.
    #[serde(default)]
    pub rows: Option<Vec<ScriptRow>>,
    #[serde(default)]
    pub event: StepEvent,
    /// Index into the current records, for `toggle` steps.
    #[serde(default)]
    pub toggle: Option<usize>,
}

/// What one step did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub step: usize,
    pub outcome: &'static str,
    pub summary: String,
    /// Records handed to the view, when this step delivered.
    pub delivered: Option<Vec<LogRecord>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub steps: Vec<StepResult>,
    pub colors: UsernameColorTable,
    pub final_records: usize,
}

#[derive(Debug, Serialize)]
struct JsonStep<'a> {
    step: usize,
    outcome: &'a str,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [LogRecord]>,
    colors: BTreeMap<&'a str, &'a str>,
}

pub fn run_for_test(args: &[&str]) -> CommandOutput {
    run_with_config(args, None)
}

/// Run with a config the caller already loaded; `None` loads it from the
/// `--config` flag or the discovery paths.
pub fn run_with_config(args: &[&str], config: Option<&OverlayConfig>) -> CommandOutput {
    let owned_args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run_with_io(&owned_args, config, &mut stdout, &mut stderr);
    CommandOutput::from_buffers(stdout, stderr, exit_code)
}

pub fn run_with_io(
    args: &[String],
    config: Option<&OverlayConfig>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match execute(args, config, stdout) {
        Ok(()) => 0,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            1
        }
    }
}

fn execute(
    args: &[String],
    preloaded: Option<&OverlayConfig>,
    stdout: &mut dyn Write,
) -> Result<(), String> {
    let parsed = parse_args(args)?;
    let loaded;
    let config = match preloaded {
        Some(config) => config,
        None => {
            let (config, used) =
                load_config(parsed.config.as_deref()).map_err(|err| format!("error: {err}"))?;
            if let Some(path) = &used {
                debug!(path = %path.display(), "loaded config");
            }
            loaded = config;
            &loaded
        }
    };

    let text = std::fs::read_to_string(&parsed.script)
        .map_err(|err| format!("error: read script {}: {err}", parsed.script))?;
    let steps = parse_script(&text).map_err(|err| format!("error: {}: {err}", parsed.script))?;
    let report = replay(config, steps)?;
    info!(
        steps = report.steps.len(),
        records = report.final_records,
        "replay finished"
    );

    if parsed.jsonl {
        write_jsonl(stdout, &report)
    } else {
        write_table(stdout, &report)
    }
}

/// Parse a script document into its steps.
pub fn parse_script(text: &str) -> Result<Vec<ReplayStep>, String> {
    if text.trim().is_empty() {
        return Err("script has no steps".to_string());
    }
    let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(|err| err.to_string())?;
    let steps = match document {
        serde_yaml::Value::Mapping(mut map) => map
            .remove("steps")
            .ok_or_else(|| "script must be a list of steps or have a `steps` key".to_string())?,
        other => other,
    };
    let steps: Vec<ReplayStep> = serde_yaml::from_value(steps).map_err(|err| err.to_string())?;
    if steps.is_empty() {
        return Err("script has no steps".to_string());
    }
    Ok(steps)
}

/// Run every step against a fresh driver and in-memory host.
pub fn replay(config: &OverlayConfig, steps: Vec<ReplayStep>) -> Result<ReplayReport, String> {
    let mut host = InMemoryHost::default().with_structural_rows(
        config.reconcile.leading_structural_rows,
        config.reconcile.trailing_structural_rows,
    );
    let mut driver = ReconciliationDriver::new(config.reconcile.clone());
    let mut sink = CollectingSink::new();
    let mut results = Vec::with_capacity(steps.len());

    for (index, step) in steps.into_iter().enumerate() {
        let number = index + 1;
        if let Some(filter) = &step.filter {
            host.set_filter(FilterFingerprint::from_parts(
                &filter.search,
                &filter.time_range,
                &filter.timezone,
            ));
        }
        if let Some(rows) = step.rows {
            host.set_rows(rows.into_iter().map(StaticRow::from).collect());
        }

        let deliveries_before = sink.delivery_count();
        let (outcome, summary) = match step.event {
            StepEvent::Mutation => describe(driver.on_collection_changed(&host, &mut sink)),
            StepEvent::FilterTick => describe(driver.on_filter_tick(&host, &mut sink)),
            StepEvent::Toggle => {
                let position = step
                    .toggle
                    .ok_or_else(|| format!("error: step {number}: toggle needs a record index"))?;
                let id = driver
                    .records()
                    .get(position)
                    .map(|record| record.id.clone())
                    .ok_or_else(|| format!("error: step {number}: no record at index {position}"))?;
                match driver.toggle_detail(&id, &mut sink) {
                    Some(true) => ("toggled", format!("expanded record {position}")),
                    Some(false) => ("toggled", format!("collapsed record {position}")),
                    None => ("toggled", format!("record {position} not found")),
                }
            }
        };
        debug!(step = number, outcome, "replayed step");

        let delivered = if sink.delivery_count() > deliveries_before {
            sink.latest().map(<[LogRecord]>::to_vec)
        } else {
            None
        };
        results.push(StepResult {
            step: number,
            outcome,
            summary,
            delivered,
        });
    }

    Ok(ReplayReport {
        steps: results,
        colors: driver.colors().clone(),
        final_records: driver.records().len(),
    })
}

fn describe(outcome: CycleOutcome) -> (&'static str, String) {
    let label = outcome.label();
    let summary = match &outcome {
        CycleOutcome::Delivered(report) | CycleOutcome::Unchanged(report) => format!(
            "{} (added {}, rejected {}, duplicates {})",
            report.delta, report.added, report.rejected, report.duplicates
        ),
        CycleOutcome::Discarded { service, report } => {
            format!("{} (service {service:?} not allowed)", report.delta)
        }
        CycleOutcome::NoOp => "no new rows".to_string(),
        CycleOutcome::FilterUnchanged => "filter unchanged".to_string(),
        CycleOutcome::SourceUnavailable => "host unavailable".to_string(),
    };
    (label, summary)
}

fn write_table(stdout: &mut dyn Write, report: &ReplayReport) -> Result<(), String> {
    for step in &report.steps {
        writeln!(stdout, "step {}: {} {}", step.step, step.outcome, step.summary)
            .map_err(|err| err.to_string())?;
        let Some(records) = &step.delivered else {
            continue;
        };

        let mut tw = TabWriter::new(&mut *stdout).padding(2);
        writeln!(tw, "TIME\tLEVEL\tUSER\tSERVICE\tMESSAGE").map_err(|err| err.to_string())?;
        for record in records {
            let user = match record.username() {
                Some(username) => format!(
                    "{username} {}",
                    report.colors.get(username).unwrap_or_default()
                ),
                None => "-".to_string(),
            };
            let service = if record.metadata.service.is_empty() {
                "-"
            } else {
                record.metadata.service.as_str()
            };
            writeln!(
                tw,
                "{}\t{}\t{}\t{}\t{}",
                record.display_time,
                record.level.label().to_ascii_uppercase(),
                user,
                service,
                record.message,
            )
            .map_err(|err| err.to_string())?;
        }
        tw.flush().map_err(|err| err.to_string())?;

        let expanded = records
            .iter()
            .filter(|record| record.is_detail_expanded && record.has_structured_payload());
        for record in expanded {
            if let Some(payload) = &record.structured_payload {
                let rendered = serde_json::to_string(payload).map_err(|err| err.to_string())?;
                writeln!(stdout, "  {} data: {rendered}", record.display_time)
                    .map_err(|err| err.to_string())?;
            }
        }
    }

    writeln!(
        stdout,
        "{} records, {} identities",
        report.final_records,
        report.colors.len()
    )
    .map_err(|err| err.to_string())
}

fn write_jsonl(stdout: &mut dyn Write, report: &ReplayReport) -> Result<(), String> {
    let colors: BTreeMap<&str, &str> = report.colors.iter().collect();
    for step in &report.steps {
        let line = JsonStep {
            step: step.step,
            outcome: step.outcome,
            summary: &step.summary,
            records: step.delivered.as_deref(),
            colors: colors.clone(),
        };
        serde_json::to_writer(&mut *stdout, &line).map_err(|err| err.to_string())?;
        writeln!(stdout).map_err(|err| err.to_string())?;
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<ParsedArgs, String> {
    let mut index = 0usize;
    let mut config = None;
    let mut jsonl = false;
    let mut positionals = Vec::new();

    while let Some(token) = args.get(index) {
        match token.as_str() {
            "-h" | "--help" | "help" => return Err(HELP_TEXT.to_string()),
            "--jsonl" => {
                jsonl = true;
                index += 1;
            }
            "--config" => {
                config = Some(take_value(args, index, "--config")?);
                index += 2;
            }
            flag if flag.starts_with('-') => {
                return Err(format!("error: unknown argument for replay: '{flag}'"));
            }
            value => {
                positionals.push(value.to_string());
                index += 1;
            }
        }
    }

    let mut positionals = positionals.into_iter();
    let script = positionals
        .next()
        .ok_or_else(|| "error: replay requires a script path".to_string())?;
    if positionals.next().is_some() {
        return Err("error: replay accepts a single script path".to_string());
    }

    Ok(ParsedArgs {
        script,
        config,
        jsonl,
    })
}

fn take_value(args: &[String], index: usize, flag: &str) -> Result<String, String> {
    args.get(index + 1)
        .cloned()
        .ok_or_else(|| format!("error: missing value for {flag}"))
}

#[cfg(test)]
mod tests {
    use super::{parse_args, parse_script, replay, ReplayStep, ScriptRow, StepEvent};
    use logdeck_core::OverlayConfig;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn parse_args_reads_flags() {
        let parsed = match parse_args(&args(&["s.yaml", "--jsonl", "--config", "c.yaml"])) {
            Ok(parsed) => parsed,
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(parsed.script, "s.yaml");
        assert_eq!(parsed.config.as_deref(), Some("c.yaml"));
        assert!(parsed.jsonl);

        assert_eq!(
            parse_args(&args(&["--config"])),
            Err("error: missing value for --config".to_string())
        );
        assert_eq!(
            parse_args(&args(&[])),
            Err("error: replay requires a script path".to_string())
        );
    }

    #[test]
    fn script_accepts_both_row_shapes_and_bare_lists() {
        let steps = match parse_script(
            r#"
- rows:
    - ["2024-03-05 09:00:01", "m1"]
    - { timestamp: "2024-03-05 09:00:02", message: "m2" }
    - [null, "Load more"]
- event: filter_tick
"#,
        ) {
            Ok(steps) => steps,
            Err(err) => panic!("script rejected: {err}"),
        };
        assert_eq!(steps.len(), 2);
        let rows = steps[0].rows.clone().unwrap_or_default();
        assert_eq!(
            rows[1],
            ScriptRow::Fields {
                timestamp: Some("2024-03-05 09:00:02".to_string()),
                message: Some("m2".to_string()),
            }
        );
        assert_eq!(rows[2], ScriptRow::Pair(None, Some("Load more".to_string())));
        assert_eq!(steps[1].event, StepEvent::FilterTick);
    }

    #[test]
    fn script_rejects_unknown_step_keys_and_empty_documents() {
        assert!(parse_script("steps:\n  - evnt: mutation\n").is_err());
        assert_eq!(parse_script("  \n"), Err("script has no steps".to_string()));
        assert_eq!(parse_script("steps: []"), Err("script has no steps".to_string()));
    }

    #[test]
    fn toggle_without_records_is_an_error() {
        let steps = vec![ReplayStep {
            event: StepEvent::Toggle,
            toggle: Some(0),
            ..ReplayStep::default()
        }];
        assert_eq!(
            replay(&OverlayConfig::default(), steps).err(),
            Some("error: step 1: no record at index 0".to_string())
        );
    }
}
