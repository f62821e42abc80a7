//! Command-line interface for the parcel matching engine.
//!
//! The `solve` subcommand reads a JSON [`parcel_match_core::Instance`], runs
//! the greedy matcher and prints the JSON [`parcel_match_core::MatchReport`].
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod solve;

pub use error::CliError;
use solve::SolveArgs;

pub(crate) const ARG_SOLVE_INSTANCE: &str = "instance";
pub(crate) const ARG_SOLVE_OUTPUT: &str = "output";
pub(crate) const ARG_SOLVE_CONSTRAINED_RESTARTS: &str = "constrained-restarts";
pub(crate) const ARG_SOLVE_FULL_RESTARTS: &str = "full-restarts";
pub(crate) const ARG_SOLVE_SEED: &str = "seed";
pub(crate) const ENV_SOLVE_INSTANCE: &str = "PARCEL_MATCH_CMDS_SOLVE_INSTANCE_PATH";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration, input loading,
/// matching or writing the report fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Solve(args) => solve::run_solve(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "parcel-match",
    about = "Match parcels to driver trips over a station network",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Match the parcels of a JSON instance and print the report.
    Solve(SolveArgs),
}

#[cfg(test)]
mod tests;
