//! # datacheck CLI entry point
//!
//! Parses command-line arguments, sets up logging, and runs the checks.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use datacheck_cli::run::{run_checks, RunArgs, EXIT_ERROR};

/// Validate the repository's JSON and JSON-Lines data files against their
/// JSON schemas.
///
/// Prints one line per violation as `[<file>] <message>` or
/// `[<file>:<line>] <message>`. Exits 0 when everything conforms, 1 when any
/// violation was found, and 2 when the run could not complete.
#[derive(Parser, Debug)]
#[command(name = "datacheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    run: RunArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut stdout = std::io::stdout().lock();

    match run_checks(&cli.run, &cwd, &mut stdout) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
