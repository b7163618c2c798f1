//! Fitted per-feature standard scaling.
//!
//! The scaler is fitted offline and loaded read-only. Each feature is mapped
//! to `(value - mean) / std`. A zero standard deviation marks a constant
//! training column and is replaced by `1.0`, so such features are centred
//! but not scaled.

use thiserror::Error;

use crate::{FEATURE_COUNT, FeatureName, FeatureVector, NormalizedVector};

/// Errors raised when constructing a [`StandardScaler`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NormalizerError {
    /// A mean was NaN or infinite.
    #[error("mean for {feature} must be finite (got {value})")]
    NonFiniteMean {
        /// Affected feature.
        feature: FeatureName,
        /// Rejected value.
        value: f64,
    },
    /// A standard deviation was negative, NaN or infinite.
    #[error("standard deviation for {feature} must be finite and non-negative (got {value})")]
    InvalidStd {
        /// Affected feature.
        feature: FeatureName,
        /// Rejected value.
        value: f64,
    },
}

/// Fitted mean and standard deviation per feature.
///
/// # Examples
/// ```
/// use techmatch_core::{FeatureVector, StandardScaler};
///
/// # fn main() -> Result<(), techmatch_core::NormalizerError> {
/// let scaler = StandardScaler::new([1.0; 8], [2.0; 8])?;
/// let normalised = scaler.transform(&FeatureVector::new([3.0; 8]));
/// assert_eq!(normalised.values(), &[1.0; 8]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    std: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Validate fitted parameters given in model order.
    ///
    /// # Errors
    /// Returns [`NormalizerError`] when a mean is not finite or a standard
    /// deviation is negative or not finite.
    pub fn new(
        mean: [f64; FEATURE_COUNT],
        std: [f64; FEATURE_COUNT],
    ) -> Result<Self, NormalizerError> {
        let mut effective_std = std;
        for ((feature, &m), s) in FeatureName::ALL
            .into_iter()
            .zip(&mean)
            .zip(&mut effective_std)
        {
            if !m.is_finite() {
                return Err(NormalizerError::NonFiniteMean { feature, value: m });
            }
            if !s.is_finite() || *s < 0.0 {
                return Err(NormalizerError::InvalidStd { feature, value: *s });
            }
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(Self {
            mean,
            std: effective_std,
        })
    }

    /// A scaler that leaves every value unchanged.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            std: [1.0; FEATURE_COUNT],
        }
    }

    /// Fitted means in model order.
    #[must_use]
    pub const fn mean(&self) -> &[f64; FEATURE_COUNT] {
        &self.mean
    }

    /// Effective standard deviations in model order, after zero substitution.
    #[must_use]
    pub const fn std(&self) -> &[f64; FEATURE_COUNT] {
        &self.std
    }

    /// Normalise a single vector.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "standard scaling subtracts the mean and divides by the deviation"
    )]
    pub fn transform(&self, vector: &FeatureVector) -> NormalizedVector {
        NormalizedVector::new(self.apply(vector.values(), |x, mean, std| (x - mean) / std))
    }

    /// Normalise a batch of vectors, preserving order.
    #[must_use]
    pub fn transform_batch(&self, vectors: &[FeatureVector]) -> Vec<NormalizedVector> {
        vectors.iter().map(|vector| self.transform(vector)).collect()
    }

    /// Undo [`StandardScaler::transform`].
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "inverse scaling multiplies by the deviation and adds the mean"
    )]
    pub fn inverse_transform(&self, vector: &NormalizedVector) -> FeatureVector {
        FeatureVector::new(self.apply(vector.values(), |x, mean, std| x.mul_add(std, mean)))
    }

    fn apply(
        &self,
        values: &[f64; FEATURE_COUNT],
        op: impl Fn(f64, f64, f64) -> f64,
    ) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0_f64; FEATURE_COUNT];
        for (slot, ((&x, &mean), &std)) in out
            .iter_mut()
            .zip(values.iter().zip(&self.mean).zip(&self.std))
        {
            *slot = op(x, mean, std);
        }
        out
    }
}
