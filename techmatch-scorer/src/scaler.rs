//! Fitted scaler state as persisted by the training pipeline.

use serde::{Deserialize, Serialize};
use techmatch_core::{FEATURE_COUNT, FeatureName, StandardScaler};

use crate::InvalidScaler;

/// Serialised standard-scaler parameters.
///
/// `scale` holds the fitted standard deviations. Lists are in model order
/// and `feature_names` must spell that order out exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtefact {
    /// Feature names in model order.
    pub feature_names: Vec<String>,
    /// Fitted means.
    pub mean: Vec<f64>,
    /// Fitted standard deviations.
    pub scale: Vec<f64>,
}

impl ScalerArtefact {
    /// Capture a scaler for persistence.
    #[must_use]
    pub fn from_scaler(scaler: &StandardScaler) -> Self {
        Self {
            feature_names: FeatureName::ALL
                .iter()
                .map(|feature| feature.as_str().to_owned())
                .collect(),
            mean: scaler.mean().to_vec(),
            scale: scaler.std().to_vec(),
        }
    }

    /// Validate the artefact and build the scaler.
    ///
    /// # Errors
    /// Returns [`InvalidScaler`] when a list has the wrong length, the
    /// feature names are out of order, or a parameter is not usable.
    pub fn into_scaler(self) -> Result<StandardScaler, InvalidScaler> {
        let names_len = self.feature_names.len();
        if names_len != FEATURE_COUNT {
            return Err(InvalidScaler::Length {
                field: "feature_names",
                expected: FEATURE_COUNT,
                found: names_len,
            });
        }
        for (position, (expected, found)) in FeatureName::ALL
            .into_iter()
            .zip(self.feature_names)
            .enumerate()
        {
            if found != expected.as_str() {
                return Err(InvalidScaler::FeatureOrder {
                    position,
                    expected,
                    found,
                });
            }
        }
        let mean = fixed("mean", &self.mean)?;
        let scale = fixed("scale", &self.scale)?;
        Ok(StandardScaler::new(mean, scale)?)
    }
}

fn fixed(field: &'static str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], InvalidScaler> {
    values.try_into().map_err(|_| InvalidScaler::Length {
        field,
        expected: FEATURE_COUNT,
        found: values.len(),
    })
}
