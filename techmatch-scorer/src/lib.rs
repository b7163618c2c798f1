//! Loading fitted scoring artefacts for the techmatch engine.
//!
//! Training happens offline and exports two artefacts:
//! - a **scaler** ([`ScalerArtefact`]): per-feature means and standard
//!   deviations, with the feature names spelled out in model order;
//! - a **model** ([`ModelArtefact`]): either an additive regression-tree
//!   ensemble ([`TreeEnsembleModel`]) or a linear scorer ([`LinearModel`]).
//!
//! Either artefact may be stored as JSON (`.json`) or `bincode` (`.bin`).
//! Loading validates structure up front so the hot path never meets a
//! malformed model. [`load_into`] installs whatever loads into a
//! [`ScoringContext`], leaving readiness to report what is missing.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use techmatch_core::ScoringContext;
//! use techmatch_scorer::load_into;
//!
//! let context = ScoringContext::empty();
//! load_into(
//!     &context,
//!     Utf8Path::new("artefacts/model.json"),
//!     Utf8Path::new("artefacts/scaler.json"),
//! )
//! .expect("load artefacts");
//! assert!(context.is_ready());
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use camino::Utf8Path;
use log::{info, warn};
use techmatch_core::{RankingModel, ScoringContext, StandardScaler};

mod artefact;
mod ensemble;
mod error;
mod linear;
mod scaler;

pub use artefact::{ArtefactFormat, ModelArtefact};
pub use ensemble::{Node, Tree, TreeEnsembleArtefact, TreeEnsembleModel};
pub use error::{ArtefactError, InvalidModel, InvalidScaler};
pub use linear::{LinearArtefact, LinearModel};
pub use scaler::ScalerArtefact;

use artefact::read_artefact;

/// Bincode options used for serializing and deserializing artefacts.
pub(crate) fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}

/// Public helper exposing the bincode configuration used for `.bin`
/// artefacts.
#[must_use]
pub fn artefact_bincode_options() -> impl bincode::Options {
    bincode_options()
}

/// Load and validate a scaler artefact.
///
/// # Errors
/// Returns [`ArtefactError`] when the file cannot be read or decoded, or
/// [`ArtefactError::InvalidScaler`] when its contents are unusable.
pub fn load_scaler(path: &Utf8Path) -> Result<StandardScaler, ArtefactError> {
    let artefact: ScalerArtefact = read_artefact(path)?;
    let scaler = artefact
        .into_scaler()
        .map_err(|source| ArtefactError::InvalidScaler {
            path: path.to_path_buf(),
            source,
        })?;
    info!("loaded scaler from {path}");
    Ok(scaler)
}

/// Load and validate a model artefact.
///
/// # Errors
/// Returns [`ArtefactError`] when the file cannot be read or decoded, or
/// [`ArtefactError::InvalidModel`] when its structure is unusable.
pub fn load_model(path: &Utf8Path) -> Result<Box<dyn RankingModel>, ArtefactError> {
    let artefact: ModelArtefact = read_artefact(path)?;
    let kind = artefact.kind();
    let model = artefact
        .into_model()
        .map_err(|source| ArtefactError::InvalidModel {
            path: path.to_path_buf(),
            source,
        })?;
    info!("loaded {kind} model from {path}");
    Ok(model)
}

/// Install both artefacts into `context`.
///
/// Each artefact is attempted independently; whatever loads is installed, so
/// [`ScoringContext::readiness`] reflects exactly which components are
/// available afterwards.
///
/// # Errors
/// Returns the first [`ArtefactError`] encountered, scaler first.
pub fn load_into(
    context: &ScoringContext,
    model_path: &Utf8Path,
    scaler_path: &Utf8Path,
) -> Result<(), ArtefactError> {
    let scaler = load_scaler(scaler_path)
        .and_then(|scaler| Ok(context.install_normalizer(scaler)?))
        .inspect_err(|err| warn!("scaler not loaded: {err}"));
    let model = load_model(model_path)
        .and_then(|model| Ok(context.install_model(model)?))
        .inspect_err(|err| warn!("model not loaded: {err}"));
    scaler.and(model)
}
