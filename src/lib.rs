//! Facade crate for the techmatch technician recommendation engine.
//!
//! This crate re-exports the core pipeline types and exposes the SQLite
//! directory and artefact loaders behind feature flags.

#![forbid(unsafe_code)]

pub use techmatch_core::{
    CandidateRecord, Component, DirectoryError, ErrorKind, FeatureName, FeatureVector,
    HistoryMetrics, InlinePayload, NotReady, RankingModel, Readiness, RecommendError, Recommender,
    ScoredTechnician, ScoringContext, ServiceRequest, StandardScaler, Technician,
    TechnicianDirectory,
};

#[cfg(feature = "store-sqlite")]
pub use techmatch_core::{SqliteDirectory, SqliteDirectoryError};

#[cfg(feature = "artefacts")]
pub use techmatch_scorer::{ArtefactError, ModelArtefact, ScalerArtefact, load_into};
