use std::path::Path;

use agent_drills::config::{DrillConfig, MAX_GRID_SIZE};
use agent_drills::entities::Mode;
use agent_drills::error::{ConfigError, DrillError};

// ── Parsing ───────────────────────────────────────────────────────────────────

#[test]
fn minimal_json_fills_defaults() {
    let config = DrillConfig::from_json(r#"{ "mode": "grid-reaction" }"#).expect("valid config");
    assert_eq!(config.mode, Mode::GridReaction);
    assert_eq!(config.difficulty, 1.0);
    assert_eq!(config.grid_size(), 4);
    assert_eq!(config.time_limit_ms(), 60_000);
    assert_eq!(config.field().width, 800.0);
    assert_eq!(config.seed, None);
}

#[test]
fn json_overrides_are_honoured() {
    let json = r#"{
        "mode": "sequence-recall",
        "difficulty": 2.5,
        "grid_size": 5,
        "time_limit_secs": 12.5,
        "seed": 7
    }"#;
    let config = DrillConfig::from_json(json).expect("valid config");
    assert_eq!(config.mode, Mode::SequenceRecall);
    assert_eq!(config.grid_size(), 5);
    assert_eq!(config.time_limit_ms(), 12_500);
    assert_eq!(config.seed, Some(7));
}

#[test]
fn unknown_mode_is_a_parse_error() {
    let err = DrillConfig::from_json(r#"{ "mode": "juggling" }"#).unwrap_err();
    assert!(matches!(err, DrillError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = DrillConfig::load_from_file(Path::new("/nonexistent/drill.json")).unwrap_err();
    match err {
        DrillError::Io { path, .. } => assert_eq!(path, Path::new("/nonexistent/drill.json")),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn invalid_json_values_fail_validation() {
    let err = DrillConfig::from_json(r#"{ "mode": "grid-reaction", "grid_size": 0 }"#).unwrap_err();
    assert!(matches!(
        err,
        DrillError::Config(ConfigError::InvalidGridSize { got: 0, .. })
    ));
}

// ── Validation ────────────────────────────────────────────────────────────────

#[test]
fn rejects_non_positive_difficulty() {
    for difficulty in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = DrillConfig::new(Mode::GridReaction, difficulty).validate();
        assert!(matches!(result, Err(ConfigError::InvalidDifficulty(_))), "{difficulty}");
    }
}

#[test]
fn rejects_oversized_grid() {
    let config = DrillConfig::new(Mode::GridReaction, 1.0).with_grid_size(MAX_GRID_SIZE + 1);
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidGridSize {
            got: MAX_GRID_SIZE + 1,
            max: MAX_GRID_SIZE
        })
    );
    let edge = DrillConfig::new(Mode::GridReaction, 1.0).with_grid_size(MAX_GRID_SIZE);
    assert_eq!(edge.validate(), Ok(()));
}

#[test]
fn rejects_non_positive_time_limit() {
    let config = DrillConfig::new(Mode::SurvivalWave, 1.0).with_time_limit(0.0);
    assert_eq!(config.validate(), Err(ConfigError::InvalidTimeLimit(0.0)));
}

#[test]
fn rejects_degenerate_field() {
    let mut config = DrillConfig::new(Mode::FreeRoamTarget, 1.0);
    config.field_height = Some(0.0);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidField { .. })));
}

#[test]
fn tiny_time_limit_still_lasts_a_millisecond() {
    let config = DrillConfig::new(Mode::GridReaction, 1.0).with_time_limit(0.0001);
    assert_eq!(config.validate(), Ok(()));
    assert_eq!(config.time_limit_ms(), 1);
}
