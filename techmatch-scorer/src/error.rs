//! Error types raised while loading scoring artefacts.

use camino::Utf8PathBuf;
use techmatch_core::{AlreadyLoaded, FeatureName, NormalizerError};
use thiserror::Error;

/// Structural problems in a scaler artefact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidScaler {
    /// A parameter list did not hold one value per feature.
    #[error("`{field}` holds {found} values; expected {expected}")]
    Length {
        /// Name of the offending list.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Length found in the artefact.
        found: usize,
    },
    /// Feature names disagree with the model order.
    #[error("feature {position} is `{found}`; expected `{expected}`")]
    FeatureOrder {
        /// Position within the artefact.
        position: usize,
        /// Feature required at this position.
        expected: FeatureName,
        /// Name found in the artefact.
        found: String,
    },
    /// The fitted parameters were rejected.
    #[error(transparent)]
    Parameters(#[from] NormalizerError),
}

/// Structural problems in a model artefact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidModel {
    /// A tree had no nodes.
    #[error("tree {tree} has no nodes")]
    EmptyTree {
        /// Tree index.
        tree: usize,
    },
    /// A split referenced a feature outside the model inputs.
    #[error("tree {tree} node {node} splits on unknown feature {feature}")]
    FeatureIndex {
        /// Tree index.
        tree: usize,
        /// Node index.
        node: usize,
        /// Feature index found.
        feature: usize,
    },
    /// A split pointed at a missing node or backwards.
    #[error("tree {tree} node {node} has invalid child {child}")]
    ChildIndex {
        /// Tree index.
        tree: usize,
        /// Node index.
        node: usize,
        /// Child index found.
        child: usize,
    },
    /// A threshold or leaf value was NaN or infinite.
    #[error("tree {tree} node {node} holds a non-finite value")]
    NonFiniteNode {
        /// Tree index.
        tree: usize,
        /// Node index.
        node: usize,
    },
    /// The weight list did not hold one weight per feature.
    #[error("linear model holds {found} weights; expected {expected}")]
    WeightCount {
        /// Required length.
        expected: usize,
        /// Length found.
        found: usize,
    },
    /// A weight, intercept or base score was NaN or infinite.
    #[error("model parameter `{parameter}` is not finite")]
    NonFiniteParameter {
        /// Name of the parameter.
        parameter: &'static str,
    },
}

/// Errors raised while reading, decoding or installing artefacts.
#[derive(Debug, Error)]
pub enum ArtefactError {
    /// The file extension does not name a supported encoding.
    #[error("unsupported artefact format for {path}; expected .json or .bin")]
    UnsupportedFormat {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Reading the artefact failed.
    #[error("failed to read artefact at {path}")]
    Read {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Decoding a JSON artefact failed.
    #[error("failed to decode JSON artefact at {path}")]
    DecodeJson {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Decoding a `bincode` artefact failed.
    #[error("failed to decode bincode artefact at {path}")]
    DecodeBincode {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The scaler artefact decoded but is unusable.
    #[error("invalid scaler artefact at {path}")]
    InvalidScaler {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Defect found.
        #[source]
        source: InvalidScaler,
    },
    /// The model artefact decoded but is unusable.
    #[error("invalid model artefact at {path}")]
    InvalidModel {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Defect found.
        #[source]
        source: InvalidModel,
    },
    /// The scoring context already held the component.
    #[error(transparent)]
    AlreadyLoaded(#[from] AlreadyLoaded),
}
