//! Rank candidates with a pretrained model.
//!
//! The [`RankingModel`] trait is the only thing the pipeline knows about the
//! model: a batch of normalised vectors goes in, one score per vector comes
//! out. Higher scores rank earlier.

use thiserror::Error;

use crate::FEATURE_COUNT;

/// A feature vector after standard scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVector([f64; FEATURE_COUNT]);

impl NormalizedVector {
    /// Wrap normalised values given in model order.
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Borrow the values in model order.
    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Index of the first non-finite value, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|value| !value.is_finite())
    }
}

/// Failures raised while scoring a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// An input vector held a NaN or infinite value.
    #[error("input row {row} has a non-finite value in column {column}")]
    MalformedInput {
        /// Row within the batch.
        row: usize,
        /// Column in model order.
        column: usize,
    },
    /// The model returned a different number of scores than inputs.
    #[error("model returned {found} scores for {expected} inputs")]
    ScoreCount {
        /// Batch size.
        expected: usize,
        /// Scores returned.
        found: usize,
    },
    /// The model produced a NaN or infinite score.
    #[error("model produced a non-finite score for row {row}")]
    NonFiniteScore {
        /// Row within the batch.
        row: usize,
    },
    /// Implementation-specific evaluation failure.
    #[error("model evaluation failed: {message}")]
    Evaluation {
        /// Description of the failure.
        message: String,
    },
}

/// Score normalised feature vectors.
///
/// Implementations must be thread-safe (`Send` + `Sync`) because one loaded
/// model serves concurrent requests. They must be deterministic: identical
/// inputs yield identical scores. An empty batch yields an empty result.
///
/// # Examples
///
/// ```rust
/// use techmatch_core::{ModelError, NormalizedVector, RankingModel};
///
/// struct SumModel;
///
/// impl RankingModel for SumModel {
///     fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
///         Ok(batch.iter().map(|v| v.values().iter().sum()).collect())
///     }
/// }
///
/// let scores = SumModel.score(&[NormalizedVector::new([0.5; 8])]).unwrap();
/// assert_eq!(scores, vec![4.0]);
/// ```
pub trait RankingModel: Send + Sync {
    /// Return one score per input vector, in input order.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the batch cannot be scored.
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError>;

    /// Reject batches containing non-finite values.
    ///
    /// # Errors
    /// Returns [`ModelError::MalformedInput`] for the first offending value.
    fn check_input(batch: &[NormalizedVector]) -> Result<(), ModelError>
    where
        Self: Sized,
    {
        check_batch(batch)
    }
}

/// Validate a batch before it reaches a model.
pub(crate) fn check_batch(batch: &[NormalizedVector]) -> Result<(), ModelError> {
    for (row, vector) in batch.iter().enumerate() {
        if let Some(column) = vector.first_non_finite() {
            return Err(ModelError::MalformedInput { row, column });
        }
    }
    Ok(())
}

/// Validate model output against its batch.
pub(crate) fn check_scores(expected: usize, scores: &[f64]) -> Result<(), ModelError> {
    if scores.len() != expected {
        return Err(ModelError::ScoreCount {
            expected,
            found: scores.len(),
        });
    }
    match scores.iter().position(|score| !score.is_finite()) {
        Some(row) => Err(ModelError::NonFiniteScore { row }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn finds_first_non_finite_column() {
        let mut values = [0.0; FEATURE_COUNT];
        values[5] = f64::NAN;
        values[6] = f64::INFINITY;
        assert_eq!(NormalizedVector::new(values).first_non_finite(), Some(5));
    }

    #[rstest]
    fn malformed_rows_are_reported() {
        let mut values = [0.0; FEATURE_COUNT];
        values[2] = f64::INFINITY;
        let batch = [NormalizedVector::new([0.0; FEATURE_COUNT]), NormalizedVector::new(values)];

        let err = check_batch(&batch).expect_err("non-finite input");

        assert_eq!(err, ModelError::MalformedInput { row: 1, column: 2 });
    }

    #[rstest]
    #[case(&[1.0], 2, ModelError::ScoreCount { expected: 2, found: 1 })]
    #[case(&[1.0, f64::NAN], 2, ModelError::NonFiniteScore { row: 1 })]
    fn bad_scores_are_rejected(
        #[case] scores: &[f64],
        #[case] expected: usize,
        #[case] error: ModelError,
    ) {
        assert_eq!(check_scores(expected, scores), Err(error));
    }

    #[rstest]
    fn empty_output_matches_empty_batch() {
        assert_eq!(check_scores(0, &[]), Ok(()));
        assert_eq!(check_batch(&[]), Ok(()));
    }
}
