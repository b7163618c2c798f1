//! Status command: report which scoring artefacts load.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use techmatch_core::{Readiness, ScoringContext};

use crate::{
    ARG_ARTEFACTS_DIR, ARG_MODEL, ARG_SCALER, CliError, DEFAULT_MODEL, DEFAULT_SCALER,
    sources::{resolve_path, write_json},
};

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Attempt to load the ranking model and fitted scaler and \
                 report which of them are usable. Load failures are \
                 reported in the output rather than as an error.",
    about = "Report scoring readiness"
)]
#[ortho_config(prefix = "TECHMATCH")]
pub(crate) struct StatusArgs {
    /// Override the path to the ranking model (`model.json`).
    #[arg(long = ARG_MODEL, value_name = "path")]
    #[serde(default)]
    pub(crate) model: Option<Utf8PathBuf>,
    /// Override the path to the fitted scaler (`scaler.json`).
    #[arg(long = ARG_SCALER, value_name = "path")]
    #[serde(default)]
    pub(crate) scaler: Option<Utf8PathBuf>,
    /// Directory containing the default artefact filenames.
    #[arg(long = ARG_ARTEFACTS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) artefacts_dir: Option<Utf8PathBuf>,
}

/// Resolved `status` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusConfig {
    pub(crate) model: Utf8PathBuf,
    pub(crate) scaler: Utf8PathBuf,
}

impl From<StatusArgs> for StatusConfig {
    fn from(args: StatusArgs) -> Self {
        let artefacts_dir = args.artefacts_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        Self {
            model: resolve_path(args.model, &artefacts_dir, DEFAULT_MODEL),
            scaler: resolve_path(args.scaler, &artefacts_dir, DEFAULT_SCALER),
        }
    }
}

/// JSON document printed by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StatusResponse {
    pub(crate) model_loaded: bool,
    pub(crate) scaler_loaded: bool,
    pub(crate) ready: bool,
}

impl From<Readiness> for StatusResponse {
    fn from(readiness: Readiness) -> Self {
        Self {
            model_loaded: readiness.model_loaded,
            scaler_loaded: readiness.normalizer_loaded,
            ready: readiness.is_ready(),
        }
    }
}

pub(crate) fn run_status(args: StatusArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_status_with(args, &mut stdout)
}

pub(crate) fn run_status_with(args: StatusArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let response = check_readiness(&StatusConfig::from(merged));
    write_json(writer, &response)
}

pub(crate) fn check_readiness(config: &StatusConfig) -> StatusResponse {
    let context = ScoringContext::empty();
    if let Err(err) = techmatch_scorer::load_into(&context, &config.model, &config.scaler) {
        debug!("status check stopped at: {err}");
    }
    StatusResponse::from(context.readiness())
}
