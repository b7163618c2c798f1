//! Linear scoring over normalised features.

use serde::{Deserialize, Serialize};
use techmatch_core::{FEATURE_COUNT, ModelError, NormalizedVector, RankingModel};

use crate::InvalidModel;

/// Serialised linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtefact {
    /// One weight per feature, in model order.
    pub weights: Vec<f64>,
    /// Constant term.
    pub intercept: f64,
}

/// Scores `intercept + Σ wᵢ·xᵢ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
}

impl LinearModel {
    /// Weights in model order.
    #[must_use]
    pub const fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }

    /// Constant term.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl TryFrom<LinearArtefact> for LinearModel {
    type Error = InvalidModel;

    fn try_from(artefact: LinearArtefact) -> Result<Self, Self::Error> {
        let weights: [f64; FEATURE_COUNT] =
            artefact
                .weights
                .as_slice()
                .try_into()
                .map_err(|_| InvalidModel::WeightCount {
                    expected: FEATURE_COUNT,
                    found: artefact.weights.len(),
                })?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(InvalidModel::NonFiniteParameter {
                parameter: "weights",
            });
        }
        if !artefact.intercept.is_finite() {
            return Err(InvalidModel::NonFiniteParameter {
                parameter: "intercept",
            });
        }
        Ok(Self {
            weights,
            intercept: artefact.intercept,
        })
    }
}

impl RankingModel for LinearModel {
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
        Self::check_input(batch)?;
        Ok(batch
            .iter()
            .map(|vector| {
                vector
                    .values()
                    .iter()
                    .zip(&self.weights)
                    .fold(self.intercept, |acc, (x, w)| x.mul_add(*w, acc))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn scores_weighted_sum() {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[0] = -2.0;
        weights[1] = 0.5;
        let model = LinearModel::try_from(LinearArtefact {
            weights,
            intercept: 1.0,
        })
        .expect("valid model");
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = 1.0;
        values[1] = 4.0;

        let scores = model.score(&[NormalizedVector::new(values)]).expect("score");

        assert_eq!(scores, vec![1.0]);
    }

    #[rstest]
    fn rejects_short_weights() {
        let err = LinearModel::try_from(LinearArtefact {
            weights: vec![1.0; 3],
            intercept: 0.0,
        })
        .expect_err("short weights");
        assert_eq!(
            err,
            InvalidModel::WeightCount {
                expected: FEATURE_COUNT,
                found: 3
            }
        );
    }

    #[rstest]
    fn rejects_non_finite_intercept() {
        let err = LinearModel::try_from(LinearArtefact {
            weights: vec![1.0; FEATURE_COUNT],
            intercept: f64::NAN,
        })
        .expect_err("nan intercept");
        assert_eq!(
            err,
            InvalidModel::NonFiniteParameter {
                parameter: "intercept"
            }
        );
    }
}
