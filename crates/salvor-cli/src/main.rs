//! Salvor CLI - offline harness for response validation
//!
//! Validates corpora of model outputs against named schemas and reports
//! pass rates, with clean passes, salvaged passes, and hard failures
//! kept apart.

mod cli;
mod csvio;
mod handlers;
mod logging;

use cli::{Cli, Commands};
use colored::control;
use colored::Colorize;
use std::process;

fn main() {
    let cli = Cli::parse_args();

    if cli.no_color {
        control::set_override(false);
    }
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Validate(args) => handlers::handle_validate(args),
        Commands::PassRates(args) => handlers::handle_pass_rates(args),
    }
}
