//! logdeck command line: replay scripted table observations through the
//! reconciliation engine and inspect single rows and identity colors.

pub mod color;
pub mod logging;
pub mod parse;
pub mod replay;

use logdeck_core::OverlayConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub(crate) fn from_buffers(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: i32) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        }
    }
}

/// Crate identity label.
pub fn crate_label() -> &'static str {
    "logdeck-cli"
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn help_text() -> String {
    format!(
        "\
logdeck reconciles a vendor log table into an ordered record stream

Usage:
  logdeck <command> [arguments]

Available Commands:
  replay      Replay a scripted sequence of table observations
  parse       Parse one row and print the resulting record
  color       Print the display color for identities
  help        Show this help

Flags:
  -h, --help      help for logdeck
  -v, --version   version for logdeck

Use \"logdeck <command> --help\" for more information about a command.
Version: {}
",
        version()
    )
}

pub fn run_cli_for_test(args: &[&str]) -> CommandOutput {
    dispatch(args, None)
}

/// Run the command line; `config` is handed to commands that need one so
/// the binary reads its config file once.
pub fn run_cli(args: &[String], config: Option<&OverlayConfig>) -> CommandOutput {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    dispatch(&refs, config)
}

fn dispatch(args: &[&str], config: Option<&OverlayConfig>) -> CommandOutput {
    let Some((cmd, rest)) = args.split_first() else {
        return CommandOutput {
            stdout: help_text(),
            stderr: String::new(),
            exit_code: 0,
        };
    };

    match *cmd {
        "--help" | "-h" | "help" => CommandOutput {
            stdout: help_text(),
            stderr: String::new(),
            exit_code: 0,
        },
        "--version" | "-v" => CommandOutput {
            stdout: format!("logdeck version {}\n", version()),
            stderr: String::new(),
            exit_code: 0,
        },
        "replay" => replay::run_with_config(rest, config),
        "parse" => parse::run_for_test(rest),
        "color" | "colors" => color::run_for_test(rest),
        _ => CommandOutput {
            stdout: String::new(),
            stderr: format!("Error: unknown command \"{cmd}\" for \"logdeck\"\n"),
            exit_code: 1,
        },
    }
}

/// Value of a `--config <path>` flag anywhere in `args`.
pub fn config_flag(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|arg| arg == "--config")
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_label_is_stable() {
        assert_eq!(crate_label(), "logdeck-cli");
    }

    #[test]
    fn no_args_shows_help() {
        let out = run_cli_for_test(&[]);
        assert_eq!(out.exit_code, 0);
        assert!(out.stdout.contains("Available Commands:"));
        assert!(out.stdout.contains("replay"));
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn version_flag_prints_version() {
        for flag in &["--version", "-v"] {
            let out = run_cli_for_test(&[flag]);
            assert_eq!(out.exit_code, 0, "flag={flag}");
            assert!(out.stdout.starts_with("logdeck version "), "flag={flag}");
        }
    }

    #[test]
    fn unknown_command_exits_1() {
        let out = run_cli_for_test(&["tail"]);
        assert_eq!(out.exit_code, 1);
        assert_eq!(out.stderr, "Error: unknown command \"tail\" for \"logdeck\"\n");
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn config_flag_is_found_after_command() {
        let args = vec![
            "replay".to_string(),
            "script.yaml".to_string(),
            "--config".to_string(),
            "overlay.yaml".to_string(),
        ];
        assert_eq!(config_flag(&args), Some("overlay.yaml"));
        assert_eq!(config_flag(&args[..2]), None);
    }
}
