//! CLI entry point for masked autoencoder reconstruction diagnostics

use clap::Parser;
use maevis::io::cli::{Cli, FileProcessor};
use maevis::io::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    let mut processor = FileProcessor::new(cli);
    logging::init(quiet, processor.multi_progress());

    match processor.process() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
