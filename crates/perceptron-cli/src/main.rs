mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use perceptron::engine::state::Outcome;
use std::process::ExitCode;
use tracing::{debug, error, info};

fn main() -> ExitCode {
    match run_app() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn exit_code_for(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Aware => ExitCode::SUCCESS,
        Outcome::Unknown => ExitCode::from(2),
        Outcome::Ambiguous => ExitCode::from(3),
    }
}

fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!(
        "🚀 Perceptron CLI v{} starting up.",
        env!("CARGO_PKG_VERSION")
    );
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Perceive(args) => {
            info!("Dispatching to 'perceive' command.");
            commands::perceive::run(args, cli.quiet).map(exit_code_for)
        }
        Commands::Check(args) => {
            info!("Dispatching to 'check' command.");
            commands::check::run(args).map(|_| ExitCode::SUCCESS)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}
