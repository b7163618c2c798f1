//! Test helpers writing artefacts, databases and payloads to a scratch
//! directory.

use camino::{Utf8Path, Utf8PathBuf};
use techmatch_core::{FEATURE_COUNT, StandardScaler, test_support::DirectorySeed};
use techmatch_scorer::{LinearArtefact, ModelArtefact, ScalerArtefact};
use tempfile::TempDir;

use crate::{DEFAULT_DATABASE, DEFAULT_MODEL, DEFAULT_SCALER};

pub(super) fn write_utf8(path: &Utf8Path, bytes: &[u8]) {
    std::fs::write(path.as_std_path(), bytes).expect("write test file");
}

/// Scratch directory laid out the way `--artefacts-dir` expects.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn model_path(&self) -> Utf8PathBuf {
        self.root.join(DEFAULT_MODEL)
    }

    pub(super) fn scaler_path(&self) -> Utf8PathBuf {
        self.root.join(DEFAULT_SCALER)
    }

    pub(super) fn database_path(&self) -> Utf8PathBuf {
        self.root.join(DEFAULT_DATABASE)
    }

    pub(super) fn payload_path(&self) -> Utf8PathBuf {
        self.root.join("payload.json")
    }

    /// Linear model preferring near, well-rated technicians.
    pub(super) fn write_model(&self) {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[0] = -1.0;
        weights[1] = 1.0;
        let artefact = ModelArtefact::Linear(LinearArtefact {
            weights,
            intercept: 0.0,
        });
        let bytes = serde_json::to_vec(&artefact).expect("encode model");
        write_utf8(&self.model_path(), &bytes);
    }

    pub(super) fn write_scaler(&self) {
        let artefact = ScalerArtefact::from_scaler(&StandardScaler::identity());
        let bytes = serde_json::to_vec(&artefact).expect("encode scaler");
        write_utf8(&self.scaler_path(), &bytes);
    }

    pub(super) fn write_artefacts(&self) {
        self.write_model();
        self.write_scaler();
    }

    /// Inline payload describing [`DirectorySeed::nearby_pair`] for
    /// `request_id`.
    pub(super) fn write_payload(&self, request_id: u64) {
        let payload = DirectorySeed::nearby_pair().inline_payload(request_id);
        let bytes = serde_json::to_vec(&payload).expect("encode payload");
        write_utf8(&self.payload_path(), &bytes);
    }

    #[cfg(feature = "store-sqlite")]
    pub(super) fn write_database(&self) {
        techmatch_core::test_support::write_sqlite_directory(
            self.database_path().as_std_path(),
            &DirectorySeed::nearby_pair(),
        )
        .expect("seed database");
    }
}
