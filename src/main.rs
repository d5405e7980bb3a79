use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use repowarden::cli::Cli;
use repowarden::commands::{self, EXIT_USAGE};
use repowarden::errors::RepoWardenError;

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match commands::run(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            let label = match e.downcast_ref::<RepoWardenError>() {
                Some(inner) if inner.is_configuration() => "configuration error:",
                _ => "error:",
            };
            eprintln!("{} {:#}", label.red().bold(), e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}
