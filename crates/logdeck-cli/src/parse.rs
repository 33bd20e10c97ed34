use std::io::Write;

use logdeck_core::parse_row;

use crate::CommandOutput;

const HELP_TEXT: &str = "\
Parse one table row and print the resulting record as JSON

Usage:
  logdeck parse <timestamp> <message>

Rows that cannot be parsed print the rejection reason and exit 1.";

pub fn run_for_test(args: &[&str]) -> CommandOutput {
    let owned_args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run_with_io(&owned_args, &mut stdout, &mut stderr);
    CommandOutput::from_buffers(stdout, stderr, exit_code)
}

pub fn run_with_io(args: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    match execute(args, stdout) {
        Ok(()) => 0,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            1
        }
    }
}

fn execute(args: &[String], stdout: &mut dyn Write) -> Result<(), String> {
    let mut positionals = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" | "help" => return Err(HELP_TEXT.to_string()),
            flag if flag.starts_with("--") => {
                return Err(format!("error: unknown argument for parse: '{flag}'"));
            }
            value => positionals.push(value),
        }
    }
    let [timestamp, message] = positionals.as_slice() else {
        return Err("error: parse expects <timestamp> <message>".to_string());
    };

    let record = parse_row(Some(*timestamp), Some(*message))
        .map_err(|rejection| format!("rejected ({}): {rejection}", rejection.kind()))?;
    serde_json::to_writer_pretty(&mut *stdout, &record).map_err(|err| err.to_string())?;
    writeln!(stdout).map_err(|err| err.to_string())
}
