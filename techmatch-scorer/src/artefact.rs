//! Artefact encodings and the model artefact envelope.

use camino::Utf8Path;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use techmatch_core::RankingModel;

use bincode::Options;

use crate::{
    ArtefactError, InvalidModel, LinearArtefact, LinearModel, TreeEnsembleArtefact,
    TreeEnsembleModel, bincode_options,
};

/// Encodings accepted for artefacts, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtefactFormat {
    /// `.json`, decoded with `serde_json`.
    Json,
    /// `.bin`, decoded with `bincode`.
    Bincode,
}

impl ArtefactFormat {
    /// Pick the encoding for `path`.
    ///
    /// # Errors
    /// Returns [`ArtefactError::UnsupportedFormat`] for any extension other
    /// than `json` or `bin`.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ArtefactError> {
        match path.extension() {
            Some("json") => Ok(Self::Json),
            Some("bin") => Ok(Self::Bincode),
            _ => Err(ArtefactError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Decode `bytes` read from `path`.
    ///
    /// # Errors
    /// Returns [`ArtefactError::DecodeJson`] or
    /// [`ArtefactError::DecodeBincode`] when the bytes do not match `T`.
    pub fn decode<T: DeserializeOwned>(
        self,
        path: &Utf8Path,
        bytes: &[u8],
    ) -> Result<T, ArtefactError> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|source| ArtefactError::DecodeJson {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Self::Bincode => bincode_options().deserialize(bytes).map_err(|source| {
                ArtefactError::DecodeBincode {
                    path: path.to_path_buf(),
                    source,
                }
            }),
        }
    }
}

/// Read and decode an artefact, choosing the encoding from its extension.
pub(crate) fn read_artefact<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, ArtefactError> {
    let format = ArtefactFormat::from_path(path)?;
    let bytes = techmatch_fs::read_utf8_file(path).map_err(|source| ArtefactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    format.decode(path, &bytes)
}

/// Serialised ranking model of any supported kind.
///
/// ```json
/// { "linear": { "weights": [-1, 1, 0, 0, 0, 0, 0, 0], "intercept": 0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtefact {
    /// Additive regression-tree ensemble.
    TreeEnsemble(TreeEnsembleArtefact),
    /// Linear weights.
    Linear(LinearArtefact),
}

impl ModelArtefact {
    /// Short name of the model kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TreeEnsemble(_) => "tree_ensemble",
            Self::Linear(_) => "linear",
        }
    }

    /// Validate the artefact and build the model.
    ///
    /// # Errors
    /// Returns [`InvalidModel`] describing the first structural defect.
    pub fn into_model(self) -> Result<Box<dyn RankingModel>, InvalidModel> {
        Ok(match self {
            Self::TreeEnsemble(artefact) => Box::new(TreeEnsembleModel::try_from(artefact)?),
            Self::Linear(artefact) => Box::new(LinearModel::try_from(artefact)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    #[case("model.json", Some(ArtefactFormat::Json))]
    #[case("artefacts/model.bin", Some(ArtefactFormat::Bincode))]
    #[case("model.pkl", None)]
    #[case("model", None)]
    fn picks_format_by_extension(#[case] input: &str, #[case] expected: Option<ArtefactFormat>) {
        let path = Utf8PathBuf::from(input);
        assert_eq!(ArtefactFormat::from_path(&path).ok(), expected);
    }

    #[rstest]
    fn parses_tagged_json() {
        let json = br#"{"linear": {"weights": [0, 0, 0, 0, 0, 0, 0, 0], "intercept": 1.5}}"#;
        let artefact: ModelArtefact = ArtefactFormat::Json
            .decode(Utf8PathBuf::from("model.json").as_path(), json)
            .expect("decode");
        assert_eq!(artefact.kind(), "linear");
    }

    #[rstest]
    fn reports_bincode_garbage() {
        let err = ArtefactFormat::Bincode
            .decode::<ModelArtefact>(Utf8PathBuf::from("model.bin").as_path(), &[0xff; 3])
            .expect_err("garbage");
        assert!(matches!(err, ArtefactError::DecodeBincode { .. }));
    }
}
