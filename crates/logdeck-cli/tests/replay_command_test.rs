use std::path::Path;

use logdeck_cli::replay::{run_for_test, run_with_config};
use logdeck_cli::CommandOutput;
use logdeck_core::OverlayConfig;

const SCRIPT: &str = r#"
steps:
  - rows:
      - ["2024-03-05 09:00:01", 'web-1 INFO - {"level":"info","msg":"boot","meta":{"service":"checkout","username":"ada"}}']
      - ["2024-03-05 09:00:02", 'web-1 WARN - {"level":"warn","msg":"slow","meta":{"service":"checkout"}}']
  - rows:
      - ["2024-03-05 09:00:01", 'web-1 INFO - {"level":"info","msg":"boot","meta":{"service":"checkout","username":"ada"}}']
      - ["2024-03-05 09:00:02", 'web-1 WARN - {"level":"warn","msg":"slow","meta":{"service":"checkout"}}']
      - { timestamp: "2024-03-05 09:00:03", message: 'web-1 ERROR - {"level":"error","msg":"fail","data":{"code":7},"meta":{"service":"checkout","username":"bob"}}' }
  - event: mutation
  - event: toggle
    toggle: 2
  - filter: { search: "fail", time_range: "1h", timezone: "UTC" }
    rows:
      - { timestamp: "2024-03-05 09:00:03", message: 'web-1 ERROR - {"level":"error","msg":"fail","data":{"code":7},"meta":{"service":"checkout","username":"bob"}}' }
    event: filter_tick
"#;

const CONFIG: &str = "\
reconcile:
  allowed_services: [checkout]
";

fn write(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    if let Err(err) = std::fs::write(&path, text) {
        panic!("write {}: {err}", path.display());
    }
    path.display().to_string()
}

fn run_script(script: &str, extra: &[&str]) -> CommandOutput {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => panic!("tempdir: {err}"),
    };
    let script_path = write(dir.path(), "script.yaml", script);
    let config_path = write(dir.path(), "config.yaml", CONFIG);
    let mut args = vec![script_path.as_str(), "--config", config_path.as_str()];
    args.extend_from_slice(extra);
    run_for_test(&args)
}

fn assert_success(out: &CommandOutput) {
    assert_eq!(out.exit_code, 0, "stderr: {}", out.stderr);
    assert!(out.stderr.is_empty(), "unexpected stderr: {}", out.stderr);
}

#[test]
fn replay_table_reports_every_step() {
    let out = run_script(SCRIPT, &[]);
    assert_success(&out);

    let steps: Vec<&str> = out
        .stdout
        .lines()
        .filter(|line| line.starts_with("step "))
        .collect();
    assert_eq!(
        steps,
        vec![
            "step 1: delivered initial [0, 2) (added 2, rejected 0, duplicates 0)",
            "step 2: delivered appended [2, 3) (added 1, rejected 0, duplicates 0)",
            "step 3: noop no new rows",
            "step 4: toggled expanded record 2",
            "step 5: delivered reset(filter_changed) [0, 1) (added 1, rejected 0, duplicates 0)",
        ]
    );
    assert!(out.stdout.contains("TIME      LEVEL  USER"));
    assert!(out.stdout.contains("09:00:03 data: {\"code\":7}"));
    assert!(out.stdout.ends_with("1 records, 2 identities\n"));
}

#[test]
fn replay_jsonl_emits_one_line_per_step() {
    let out = run_script(SCRIPT, &["--jsonl"]);
    assert_success(&out);

    let lines: Vec<serde_json::Value> = out
        .stdout
        .lines()
        .map(|line| match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => panic!("invalid json line {line:?}: {err}"),
        })
        .collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0]["outcome"], "delivered");
    assert_eq!(lines[0]["records"].as_array().map(Vec::len), Some(2));
    assert_eq!(lines[0]["records"][0]["message"], "boot");
    assert_eq!(lines[0]["records"][0]["metadata"]["service"], "checkout");
    assert!(lines[2].get("records").is_none());
    assert_eq!(lines[3]["records"][2]["is_detail_expanded"], true);
    assert_eq!(lines[4]["records"].as_array().map(Vec::len), Some(1));
    assert!(lines[4]["colors"]["ada"].is_string());
}

#[test]
fn replay_discards_batches_from_other_services() {
    let script = r#"
- rows:
    - ["2024-03-05 09:00:01", '{"msg":"ads","meta":{"service":"ads"}}']
"#;
    let out = run_script(script, &[]);
    assert_success(&out);
    assert!(
        out.stdout
            .starts_with("step 1: discarded initial [0, 1) (service \"ads\" not allowed)\n"),
        "stdout: {}",
        out.stdout
    );
    assert!(out.stdout.ends_with("0 records, 0 identities\n"));
}

#[test]
fn replay_skips_detail_line_for_empty_payload() {
    let script = r#"
- rows:
    - ["2024-03-05 09:00:01", '{"msg":"bare","data":{},"meta":{"service":"checkout"}}']
- event: toggle
  toggle: 0
"#;
    let out = run_script(script, &[]);
    assert_success(&out);
    assert!(out.stdout.contains("step 2: toggled expanded record 0"));
    assert!(!out.stdout.contains("data:"), "stdout: {}", out.stdout);
}

#[test]
fn replay_uses_preloaded_config_without_reading_flag_path() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => panic!("tempdir: {err}"),
    };
    let script = r#"
- rows:
    - ["2024-03-05 09:00:01", '{"msg":"boot","meta":{"service":"checkout"}}']
"#;
    let script_path = write(dir.path(), "script.yaml", script);
    let mut config = OverlayConfig::default();
    config.reconcile.allowed_services = vec!["ads".to_string()];

    // The flag path does not exist; only the preloaded config is consulted.
    let out = run_with_config(
        &[script_path.as_str(), "--config", "/nonexistent/logdeck.yaml"],
        Some(&config),
    );
    assert_success(&out);
    assert!(
        out.stdout
            .starts_with("step 1: discarded initial [0, 1) (service \"checkout\" not allowed)\n"),
        "stdout: {}",
        out.stdout
    );
}

#[test]
fn replay_rejects_missing_script() {
    let out = run_for_test(&["/nonexistent/logdeck-script.yaml", "--config", "/dev/null"]);
    assert_eq!(out.exit_code, 1);
    assert!(out.stdout.is_empty());
    assert!(
        out.stderr
            .starts_with("error: read script /nonexistent/logdeck-script.yaml:"),
        "stderr: {}",
        out.stderr
    );
}

#[test]
fn replay_rejects_unreadable_explicit_config() {
    let out = run_for_test(&["script.yaml", "--config", "/nonexistent/logdeck.yaml"]);
    assert_eq!(out.exit_code, 1);
    assert!(out.stderr.starts_with("error: failed to load config file"));
}

#[test]
fn replay_rejects_unknown_flag() {
    let out = run_for_test(&["script.yaml", "--follow"]);
    assert_eq!(out.exit_code, 1);
    assert_eq!(out.stderr, "error: unknown argument for replay: '--follow'\n");
}
