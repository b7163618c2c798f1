//! Recommend command implementation for the techmatch CLI.

use std::{io::Write, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use techmatch_core::{
    InlinePayload, Recommender, ScoredTechnician, ScoringContext, TechnicianDirectory,
};

use crate::{
    ARG_ARTEFACTS_DIR, ARG_DATABASE, ARG_LIMIT, ARG_MODEL, ARG_PAYLOAD, ARG_REQUEST_ID,
    ARG_SCALER, CliError, DEFAULT_DATABASE, DEFAULT_MODEL, DEFAULT_SCALER, ENV_REQUEST_ID,
    sources::{require_existing, resolve_path, write_json},
};

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the available technicians for a service request. \
                 Candidates come from the SQLite technician database, or \
                 from a JSON payload holding the request and its candidates \
                 when --payload is given.",
    about = "Rank technicians for a service request"
)]
#[ortho_config(prefix = "TECHMATCH")]
pub(crate) struct RecommendArgs {
    /// Identifier of the service request to rank for.
    #[arg(value_name = "request-id")]
    #[serde(default)]
    pub(crate) request_id: Option<u64>,
    /// JSON payload with the request and candidates; bypasses the database.
    #[arg(long = ARG_PAYLOAD, value_name = "path")]
    #[serde(default)]
    pub(crate) payload: Option<Utf8PathBuf>,
    /// Override the path to the SQLite technician database (`techmatch.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
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
    /// Print at most this many technicians.
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl RecommendArgs {
    pub(crate) fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Where candidates are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CandidateSource {
    /// Inline JSON payload.
    Payload(Utf8PathBuf),
    /// SQLite technician database.
    Database(Utf8PathBuf),
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecommendConfig {
    pub(crate) request_id: u64,
    pub(crate) source: CandidateSource,
    pub(crate) model: Utf8PathBuf,
    pub(crate) scaler: Utf8PathBuf,
    pub(crate) limit: Option<usize>,
}

impl RecommendConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.model, ARG_MODEL)?;
        require_existing(&self.scaler, ARG_SCALER)?;
        match &self.source {
            CandidateSource::Payload(path) => require_existing(path, ARG_PAYLOAD),
            CandidateSource::Database(path) => require_existing(path, ARG_DATABASE),
        }
    }
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let request_id = args.request_id.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST_ID,
            env: ENV_REQUEST_ID,
        })?;

        let artefacts_dir = args.artefacts_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        let source = match args.payload {
            Some(payload) => CandidateSource::Payload(payload),
            None => CandidateSource::Database(resolve_path(
                args.database,
                &artefacts_dir,
                DEFAULT_DATABASE,
            )),
        };

        Ok(Self {
            request_id,
            source,
            model: resolve_path(args.model, &artefacts_dir, DEFAULT_MODEL),
            scaler: resolve_path(args.scaler, &artefacts_dir, DEFAULT_SCALER),
            limit: args.limit,
        })
    }
}

/// JSON document printed by `recommend`.
#[derive(Debug, Serialize)]
pub(crate) struct RecommendResponse {
    pub(crate) request_id: u64,
    pub(crate) recommended: Vec<ScoredTechnician>,
    pub(crate) total: usize,
}

impl RecommendResponse {
    fn new(request_id: u64, mut ranked: Vec<ScoredTechnician>, limit: Option<usize>) -> Self {
        let total = ranked.len();
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        Self {
            request_id,
            recommended: ranked,
            total,
        }
    }
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_recommend_with(args, &mut stdout)
}

pub(crate) fn run_recommend_with(
    args: RecommendArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let response = execute_recommend(args)?;
    write_json(writer, &response)
}

fn execute_recommend(args: RecommendArgs) -> Result<RecommendResponse, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;

    let context = Arc::new(ScoringContext::empty());
    techmatch_scorer::load_into(&context, &config.model, &config.scaler)?;

    let request_id = config.request_id;
    let ranked = match &config.source {
        CandidateSource::Payload(path) => {
            let payload = load_payload(path)?;
            let absent: Option<&dyn TechnicianDirectory> = None;
            Recommender::new(context, absent)
                .recommend(request_id, Some(&payload))
                .map_err(|source| CliError::Recommend { request_id, source })?
        }
        CandidateSource::Database(path) => recommend_from_database(context, path, request_id)?,
    };

    info!("request {request_id}: ranked {} technicians", ranked.len());
    Ok(RecommendResponse::new(request_id, ranked, config.limit))
}

#[cfg(feature = "store-sqlite")]
fn recommend_from_database(
    context: Arc<ScoringContext>,
    path: &Utf8Path,
    request_id: u64,
) -> Result<Vec<ScoredTechnician>, CliError> {
    let directory = techmatch_core::SqliteDirectory::open(path.as_std_path())?;
    Recommender::new(context, directory)
        .recommend(request_id, None)
        .map_err(|source| CliError::Recommend { request_id, source })
}

#[cfg(not(feature = "store-sqlite"))]
fn recommend_from_database(
    _context: Arc<ScoringContext>,
    _path: &Utf8Path,
    _request_id: u64,
) -> Result<Vec<ScoredTechnician>, CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "reading technicians from a database",
    })
}

/// Loads a JSON-encoded [`InlinePayload`] from disk.
pub(crate) fn load_payload(path: &Utf8Path) -> Result<InlinePayload, CliError> {
    let bytes = techmatch_fs::read_utf8_file(path).map_err(|source| CliError::ReadPayload {
        path: path.to_path_buf(),
        source,
    })?;
    InlinePayload::from_json_slice(&bytes).map_err(|source| CliError::ParsePayload {
        path: path.to_path_buf(),
        source,
    })
}
