use logdeck_cli::{run_cli, run_cli_for_test};

#[test]
fn help_lists_every_command() {
    for flag in &["--help", "-h", "help"] {
        let out = run_cli_for_test(&[flag]);
        assert_eq!(out.exit_code, 0, "flag={flag}");
        for command in ["replay", "parse", "color", "help"] {
            assert!(out.stdout.contains(command), "flag={flag} command={command}");
        }
    }
}

#[test]
fn parse_prints_record_json() {
    let out = run_cli(&[
        "parse".to_string(),
        "2024-03-05 09:15:42.120".to_string(),
        r#"ip-10-0-0-1 ERROR - {"id":"evt-1","level":"error","msg":"payment failed","data":{"order":17},"meta":{"service":"checkout","appVersion":"2.4.1","label":"API","username":"ada"}}"#.to_string(),
    ], None);
    assert_eq!(out.exit_code, 0, "stderr: {}", out.stderr);

    let record: serde_json::Value = match serde_json::from_str(&out.stdout) {
        Ok(record) => record,
        Err(err) => panic!("invalid json {:?}: {err}", out.stdout),
    };
    assert_eq!(record["display_time"], "09:15:42");
    assert_eq!(record["level"], "error");
    assert_eq!(record["message"], "payment failed");
    assert_eq!(record["structured_payload"]["order"], 17);
    assert_eq!(record["metadata"]["app_version"], "2.4.1");
    assert_eq!(record["metadata"]["label"], "API");
    assert_eq!(record["metadata"]["username"], "ada");
    assert_eq!(record["is_detail_expanded"], false);
    assert!(record.get("content_key").is_none());
}

#[test]
fn parse_reports_rejection_reason() {
    let out = run_cli_for_test(&["parse", "", r#"{"msg":"x"}"#]);
    assert_eq!(out.exit_code, 1);
    assert!(out.stdout.is_empty());
    assert_eq!(
        out.stderr,
        "rejected (missing_timestamp): row has no timestamp text\n"
    );

    let out = run_cli_for_test(&["parse", "2024-03-05 09:00:00", "svc - {not json"]);
    assert_eq!(out.exit_code, 1);
    assert!(out.stderr.starts_with("rejected ("), "stderr: {}", out.stderr);
}

#[test]
fn color_is_stable_across_invocations() {
    let first = run_cli_for_test(&["color", "ada", "bob"]);
    let second = run_cli_for_test(&["color", "ada", "bob"]);
    assert_eq!(first.exit_code, 0);
    assert_eq!(first, second);
    assert_eq!(first.stdout.lines().count(), 3);
}
