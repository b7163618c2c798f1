//! Focused unit tests covering recommend configuration and payload parsing.

use super::helpers::{Workspace, write_utf8};
use super::*;
use crate::recommend::{
    CandidateSource, RecommendArgs, RecommendConfig, load_payload, run_recommend_with,
};
use camino::Utf8PathBuf;
use rstest::rstest;
use techmatch_core::{PayloadError, test_support::DirectorySeed};

#[rstest]
fn converting_without_request_id_errors() {
    let err = RecommendConfig::try_from(RecommendArgs::default())
        .expect_err("missing request id should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_REQUEST_ID);
            assert_eq!(env, ENV_REQUEST_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn config_derives_default_artefact_paths() {
    let args = RecommendArgs {
        request_id: Some(7),
        artefacts_dir: Some(Utf8PathBuf::from("/srv/techmatch")),
        ..RecommendArgs::default()
    };

    let config = RecommendConfig::try_from(args).expect("config should build");

    assert_eq!(config.request_id, 7);
    assert_eq!(config.model, Utf8PathBuf::from("/srv/techmatch/model.json"));
    assert_eq!(config.scaler, Utf8PathBuf::from("/srv/techmatch/scaler.json"));
    assert_eq!(
        config.source,
        CandidateSource::Database(Utf8PathBuf::from("/srv/techmatch/techmatch.db"))
    );
    assert_eq!(config.limit, None);
}

#[rstest]
fn payload_replaces_database() {
    let args = RecommendArgs {
        request_id: Some(7),
        payload: Some(Utf8PathBuf::from("payload.json")),
        database: Some(Utf8PathBuf::from("ignored.db")),
        model: Some(Utf8PathBuf::from("m.bin")),
        ..RecommendArgs::default()
    };

    let config = RecommendConfig::try_from(args).expect("config should build");

    assert_eq!(
        config.source,
        CandidateSource::Payload(Utf8PathBuf::from("payload.json"))
    );
    assert_eq!(config.model, Utf8PathBuf::from("m.bin"));
    assert_eq!(config.scaler, Utf8PathBuf::from("./scaler.json"));
}

#[rstest]
#[case::model(ARG_MODEL)]
#[case::scaler(ARG_SCALER)]
#[case::payload(ARG_PAYLOAD)]
fn validate_sources_reports_missing_inputs(#[case] missing: &'static str) {
    let workspace = Workspace::new();
    if missing != ARG_MODEL {
        workspace.write_model();
    }
    if missing != ARG_SCALER {
        workspace.write_scaler();
    }
    if missing != ARG_PAYLOAD {
        workspace.write_payload(7);
    }
    let config = RecommendConfig {
        request_id: 7,
        source: CandidateSource::Payload(workspace.payload_path()),
        model: workspace.model_path(),
        scaler: workspace.scaler_path(),
        limit: None,
    };

    let err = config.validate_sources().expect_err("expected failure");

    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, missing),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_directory_database() {
    let workspace = Workspace::new();
    workspace.write_artefacts();
    let database = workspace.database_path();
    std::fs::create_dir(database.as_std_path()).expect("database directory");
    let config = RecommendConfig {
        request_id: 7,
        source: CandidateSource::Database(database.clone()),
        model: workspace.model_path(),
        scaler: workspace.scaler_path(),
        limit: None,
    };

    let err = config
        .validate_sources()
        .expect_err("expected directory path to fail validation");

    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_DATABASE);
            assert_eq!(path, database);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_payload_reports_invalid_json() {
    let workspace = Workspace::new();
    let path = workspace.payload_path();
    write_utf8(&path, b"{ not valid json");

    let err = load_payload(&path).expect_err("invalid JSON should fail");

    match err {
        CliError::ParsePayload {
            path: reported,
            source: PayloadError::Json { .. },
        } => assert_eq!(reported, path),
        other => panic!("expected ParsePayload, found {other:?}"),
    }
}

#[rstest]
fn load_payload_reads_seeded_candidates() {
    let workspace = Workspace::new();
    workspace.write_payload(7);

    let payload = load_payload(&workspace.payload_path()).expect("payload should parse");

    assert_eq!(payload.request.id, Some(7));
    assert_eq!(payload.candidates.len(), 2);
}

#[rstest]
fn recommend_errors_name_the_bad_payload_field() {
    let workspace = Workspace::new();
    workspace.write_artefacts();
    let mut payload = DirectorySeed::nearby_pair().inline_payload(DirectorySeed::REQUEST_ID);
    payload.candidates[1].technician_id = None;
    let bytes = serde_json::to_vec(&payload).expect("encode payload");
    write_utf8(&workspace.payload_path(), &bytes);
    let args = RecommendArgs {
        request_id: Some(DirectorySeed::REQUEST_ID),
        payload: Some(workspace.payload_path()),
        artefacts_dir: Some(workspace.root().to_owned()),
        ..RecommendArgs::default()
    };

    let err = run_recommend_with(args, &mut Vec::new()).expect_err("payload should be rejected");

    assert!(matches!(err, CliError::Recommend { .. }), "unexpected {err:?}");
    let message = err.to_string();
    assert!(
        message.contains("candidates[1].technician_id"),
        "message should name the field: {message}"
    );
}
