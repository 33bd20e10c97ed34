fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    // A broken config is left for the command to load and report.
    let config = logdeck_core::load_config(logdeck_cli::config_flag(&args))
        .ok()
        .map(|(config, _)| config);
    let logging = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _ = logdeck_cli::logging::init(&logging);

    let out = logdeck_cli::run_cli(&args, config.as_ref());
    if !out.stdout.is_empty() {
        print!("{}", out.stdout);
    }
    if !out.stderr.is_empty() {
        eprint!("{}", out.stderr);
    }
    std::process::exit(out.exit_code);
}
