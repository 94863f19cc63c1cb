use clap::Parser;
use std::process;

mod cli;
mod commands;
mod display;
mod exit_codes;

use cli::Cli;
use commands::Completion;
use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_WARNING};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    configure_logging(cli.verbose, cli.debug, cli.quiet);

    let exit_code = match commands::run(cli).await {
        Ok(Completion::Done) => EXIT_SUCCESS,
        Ok(Completion::RolledBack) => EXIT_WARNING,
        Err(e) => {
            tracing::debug!("command failed: {e:?}");
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    };
    process::exit(exit_code);
}

fn configure_logging(verbose: bool, debug: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else if verbose {
        Level::TRACE
    } else {
        Level::WARN
    };

    // Logs go to stderr so table/JSON output on stdout stays clean
    registry()
        .with(EnvFilter::new(format!("figment=warn,{log_level}")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
