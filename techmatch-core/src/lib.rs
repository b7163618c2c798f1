//! Core domain types and the scoring pipeline for the techmatch engine.
//!
//! A recommendation runs strictly forward: a [`ServiceRequest`] and its
//! [`CandidateRecord`]s are assembled into a [`FeatureTable`], normalised by a
//! fitted [`StandardScaler`], scored by a [`RankingModel`] and ordered by
//! [`rank`]. The loaded normaliser and model live in a [`ScoringContext`]
//! which callers build once and share by reference.
//!
//! Constructors and conversions return `Result` so structural problems
//! surface at the boundary rather than inside the model.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod distance;
pub mod features;
pub mod model;
pub mod normalizer;
pub mod payload;
pub mod ranker;
pub mod recommend;
pub mod request;
pub mod store;
pub mod technician;
pub mod test_support;

pub use context::{AlreadyLoaded, Component, NotReady, Readiness, ScoringContext};
pub use distance::{
    Distance, DistanceError, EARTH_RADIUS_KM, UNKNOWN_DISTANCE_KM, distance_km, haversine_km,
    haversine_km_many, haversine_km_pairs,
};
pub use features::{
    FEATURE_COUNT, FeatureError, FeatureName, FeatureTable, FeatureVector, assemble,
};
pub use model::{ModelError, NormalizedVector, RankingModel};
pub use normalizer::{NormalizerError, StandardScaler};
pub use payload::{Availability, InlineCandidate, InlinePayload, InlineRequest, PayloadError};
pub use ranker::{ScoredTechnician, rank};
pub use recommend::{ErrorKind, RecommendError, Recommender};
pub use request::ServiceRequest;
pub use store::{DirectoryError, TechnicianDirectory};
#[cfg(feature = "store-sqlite")]
pub use store::{SqliteDirectory, SqliteDirectoryError};
pub use technician::{
    AggregateTables, CandidateRecord, HistoryMetrics, PriceAggregate, RatingAggregate, Technician,
};
