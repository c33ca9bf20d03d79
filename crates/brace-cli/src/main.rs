use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use brace_cli::{Args, render_error};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Brace");
    debug!(args:?; "Parsed arguments");

    let app_config = match brace_cli::load_config(&args) {
        Ok(app_config) => app_config,
        Err(err) => fail(&render_error(&err, args.trace)),
    };

    if let Err(err) = brace_cli::run_with_config(&args, app_config) {
        fail(&render_error(&err, app_config.diagnostics.trace));
    }

    info!("Completed successfully");
}

fn fail(report: &str) -> ! {
    error!("Failed");
    eprint!("{report}");
    process::exit(1);
}
