//! Read-only scoring state shared by every recommendation.
//!
//! A [`ScoringContext`] is built once at process start and shared by
//! reference (or through an `Arc`). Each component is installed at most once
//! and never mutated afterwards, so concurrent readers need no locking. A
//! component that has not been installed yet surfaces as [`NotReady`]; the
//! hot path never loads anything itself.

use std::{fmt, sync::OnceLock};

use thiserror::Error;

use crate::{RankingModel, StandardScaler};

/// Loadable pieces of the scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The fitted [`StandardScaler`].
    Normalizer,
    /// The [`RankingModel`].
    Model,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalizer => f.write_str("normalizer"),
            Self::Model => f.write_str("ranking model"),
        }
    }
}

/// A required component is not loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{component} is not loaded")]
pub struct NotReady {
    /// The missing component.
    pub component: Component,
}

/// Load state of each component, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Readiness {
    /// Whether the fitted scaler is installed.
    pub normalizer_loaded: bool,
    /// Whether the ranking model is installed.
    pub model_loaded: bool,
}

impl Readiness {
    /// Report whether every component is installed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        self.normalizer_loaded && self.model_loaded
    }
}

/// Normaliser and model shared across scoring calls.
///
/// # Examples
/// ```
/// use techmatch_core::{Component, ScoringContext, StandardScaler};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let context = ScoringContext::empty();
/// assert_eq!(context.normalizer().unwrap_err().component, Component::Normalizer);
///
/// context.install_normalizer(StandardScaler::new([0.0; 8], [1.0; 8])?)?;
/// assert!(context.readiness().normalizer_loaded);
/// assert!(!context.is_ready());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ScoringContext {
    normalizer: OnceLock<StandardScaler>,
    model: OnceLock<Box<dyn RankingModel>>,
}

/// Raised when a component is installed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{component} is already loaded")]
pub struct AlreadyLoaded {
    /// The component that was already present.
    pub component: Component,
}

impl fmt::Debug for ScoringContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringContext")
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

impl ScoringContext {
    /// Create a context with nothing loaded.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            normalizer: OnceLock::new(),
            model: OnceLock::new(),
        }
    }

    /// Create a fully loaded context.
    #[must_use]
    pub fn ready(normalizer: StandardScaler, model: impl RankingModel + 'static) -> Self {
        Self {
            normalizer: OnceLock::from(normalizer),
            model: OnceLock::from(Box::new(model) as Box<dyn RankingModel>),
        }
    }

    /// Install the fitted scaler.
    ///
    /// # Errors
    /// Returns [`AlreadyLoaded`] if a scaler is already installed.
    pub fn install_normalizer(&self, normalizer: StandardScaler) -> Result<(), AlreadyLoaded> {
        self.normalizer.set(normalizer).map_err(|_| AlreadyLoaded {
            component: Component::Normalizer,
        })
    }

    /// Install the ranking model.
    ///
    /// # Errors
    /// Returns [`AlreadyLoaded`] if a model is already installed.
    pub fn install_model(&self, model: Box<dyn RankingModel>) -> Result<(), AlreadyLoaded> {
        self.model.set(model).map_err(|_| AlreadyLoaded {
            component: Component::Model,
        })
    }

    /// Borrow the scaler.
    ///
    /// # Errors
    /// Returns [`NotReady`] when no scaler is installed.
    pub fn normalizer(&self) -> Result<&StandardScaler, NotReady> {
        self.normalizer.get().ok_or(NotReady {
            component: Component::Normalizer,
        })
    }

    /// Borrow the model.
    ///
    /// # Errors
    /// Returns [`NotReady`] when no model is installed.
    pub fn model(&self) -> Result<&dyn RankingModel, NotReady> {
        self.model.get().map(Box::as_ref).ok_or(NotReady {
            component: Component::Model,
        })
    }

    /// Report which components are installed.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        Readiness {
            normalizer_loaded: self.normalizer.get().is_some(),
            model_loaded: self.model.get().is_some(),
        }
    }

    /// Report whether both components are installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness().is_ready()
    }
}
