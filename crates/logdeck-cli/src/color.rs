use std::io::Write;

use logdeck_core::identity_color;
use tabwriter::TabWriter;

use crate::CommandOutput;

const HELP_TEXT: &str = "\
Print the display color assigned to each identity

Usage:
  logdeck color <identity>...

An empty identity prints the neutral default color.";

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
    let mut identities = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" | "help" => return Err(HELP_TEXT.to_string()),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("error: unknown argument for color: '{flag}'"));
            }
            identity => identities.push(identity),
        }
    }
    if identities.is_empty() {
        return Err("error: color requires at least one identity".to_string());
    }

    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "IDENTITY\tCOLOR").map_err(|err| err.to_string())?;
    for identity in identities {
        let shown = if identity.trim().is_empty() {
            "(none)"
        } else {
            identity
        };
        writeln!(tw, "{shown}\t{}", identity_color(identity)).map_err(|err| err.to_string())?;
    }
    tw.flush().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::run_for_test;

    #[test]
    fn prints_one_row_per_identity() {
        let out = run_for_test(&["a", ""]);
        assert_eq!(out.exit_code, 0, "stderr: {}", out.stderr);
        assert_eq!(
            out.stdout,
            "IDENTITY  COLOR\na         #610000\n(none)    #dedede\n"
        );
    }

    #[test]
    fn requires_an_identity() {
        let out = run_for_test(&[]);
        assert_eq!(out.exit_code, 1);
        assert_eq!(out.stderr, "error: color requires at least one identity\n");
    }
}
