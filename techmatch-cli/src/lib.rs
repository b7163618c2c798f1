//! Command-line interface for ranking technicians with techmatch.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod recommend;
mod sources;
mod status;

pub use error::CliError;

use recommend::{RecommendArgs, run_recommend};
use status::{StatusArgs, run_status};

pub(crate) const ARG_REQUEST_ID: &str = "request-id";
pub(crate) const ARG_PAYLOAD: &str = "payload";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_MODEL: &str = "model";
pub(crate) const ARG_SCALER: &str = "scaler";
pub(crate) const ARG_ARTEFACTS_DIR: &str = "artefacts-dir";
pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ENV_REQUEST_ID: &str = "TECHMATCH_CMDS_RECOMMEND_REQUEST_ID";

pub(crate) const DEFAULT_DATABASE: &str = "techmatch.db";
pub(crate) const DEFAULT_MODEL: &str = "model.json";
pub(crate) const DEFAULT_SCALER: &str = "scaler.json";

/// Run the techmatch CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, an
/// input cannot be loaded, or ranking fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Recommend(args) => run_recommend(args),
        Command::Status(args) => run_status(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "techmatch",
    about = "Rank available technicians for a service request",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank technicians for one service request.
    Recommend(RecommendArgs),
    /// Report which scoring artefacts load.
    Status(StatusArgs),
}

#[cfg(test)]
mod tests;
