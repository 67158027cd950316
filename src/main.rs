mod aggregate;
mod cli;
mod commands;
mod config;
mod cost;
mod dataset;
mod error;
mod formula;
mod logging;
mod ranking;
mod report;
mod revision;
mod score_table;
mod types;
mod validation;

use crate::error::OpennessError;
use clap::Parser;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const WARNINGS: i32 = 1;
    pub const BLOCKING: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn run() -> Result<i32, OpennessError> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    match &cli.command {
        cli::Commands::Rate(cmd) => commands::rate(cmd),
        cli::Commands::Rank(cmd) => commands::rank(cmd),
        cli::Commands::Costs(cmd) => commands::costs(cmd),
        cli::Commands::Table(cmd) => commands::table(cmd),
        cli::Commands::Score(cmd) => commands::score(cmd),
        cli::Commands::Check(cmd) => commands::check(cmd),
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
