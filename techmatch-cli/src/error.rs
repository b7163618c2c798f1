//! Error types emitted by the techmatch CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use techmatch_core::{PayloadError, RecommendError};
use techmatch_scorer::ArtefactError;
use thiserror::Error;

/// Errors emitted by the techmatch CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that also supplies it.
        env: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature name.
        feature: &'static str,
        /// What the user asked for.
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path given.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path given.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Path given.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Loading the model or scaler failed.
    #[error("failed to load scoring artefacts: {0}")]
    LoadArtefacts(#[from] ArtefactError),
    /// Reading the inline payload failed.
    #[error("failed to read payload at {path:?}: {source}")]
    ReadPayload {
        /// Payload path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The inline payload was not valid JSON.
    #[error("failed to parse payload at {path:?}: {source}")]
    ParsePayload {
        /// Payload path.
        path: Utf8PathBuf,
        /// Decoding failure.
        #[source]
        source: PayloadError,
    },
    /// Opening the technician database failed.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    OpenDirectory(#[from] techmatch_core::SqliteDirectoryError),
    /// The recommendation pipeline failed.
    #[error("recommendation for request {request_id} failed: {source}")]
    Recommend {
        /// Request being ranked.
        request_id: u64,
        /// Pipeline failure.
        #[source]
        source: RecommendError,
    },
    /// Serializing the command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
