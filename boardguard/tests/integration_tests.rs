//! Integration tests for the BoardGuard library

use boardguard::prelude::*;
use boardguard::{check_names, BoardStats, ExportPayload};
use std::io::Write;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_validate_valid_board() {
    let result = BoardGuardCore::validate_file(&fixture_path("valid_board.json"), &ValidationOptions::default())
        .expect("Valid board should parse successfully");

    assert_eq!(result.stats.errors, 0, "findings: {:?}", result.errors);
    assert!(!result.has_errors());
    assert!(!result.blocks(true));
    assert_eq!(result.checks_run, check_names());
}

#[test]
fn test_validate_invalid_board() {
    let result = BoardGuardCore::validate_file(&fixture_path("invalid_board.json"), &ValidationOptions::default())
        .expect("Should parse successfully");

    assert_eq!(result.stats.errors, 10);
    assert_eq!(result.total_issues(), 10);
    assert!(result.blocks(true), "strict policy blocks on errors");
    assert!(!result.blocks(false), "permissive policy never blocks");
}

#[test]
fn test_parse_errors_surface_as_single_record() {
    for (name, code) in [
        ("truncated.json", ErrorCode::MalformedJson),
        ("inch_units.json", ErrorCode::InvalidUnitSpecification),
        ("missing.json", ErrorCode::FileIoError),
    ] {
        let err = BoardGuardCore::validate_file(&fixture_path(name), &ValidationOptions::default())
            .expect_err("should fail to parse");
        match err {
            BoardGuardError::Parse(e) => {
                assert_eq!(e.code(), code, "{name}");
                assert!(e.code().is_terminal());
            }
            other => panic!("{name}: unexpected error {other}"),
        }
    }
}

#[test]
fn test_board_stats_from_fixture() {
    let result = BoardGuardCore::validate_file(&fixture_path("valid_board.json"), &ValidationOptions::default())
        .unwrap();
    let stats: BoardStats = result.board_stats();

    assert_eq!(stats.board_dimensions_mm, [50.0, 40.0]);
    assert_eq!(stats.board_area_mm2, 2000.0);
    assert_eq!(stats.num_components, 2);
    assert_eq!(stats.num_traces, 3);
    assert_eq!(stats.layer_count, 3);
    assert_eq!(stats.total_thickness_mm, Some(1.6));
    let exported = serde_json::to_value(&stats).unwrap();
    assert_eq!(exported["total_thickness_mm"], 1.6);
    assert!((exported["total_thickness_um"].as_f64().unwrap() - 1600.0).abs() < 1e-9);
    let ratio = stats.via_aspect_ratio.expect("board has a via");
    assert!((ratio - 1.6 / 0.3).abs() < 1e-9);
    // T_GND 8 + T_SIG 9 + T_VCC (7 + sqrt(53))
    let expected = 8.0 + 9.0 + 7.0 + 53f64.sqrt();
    assert!((stats.trace_length_total_mm - expected).abs() < 1e-9);
}

#[test]
fn test_export_payload_round_trip_through_json() {
    let result = BoardGuardCore::validate_file(&fixture_path("invalid_board.json"), &ValidationOptions::default())
        .unwrap();
    let payload = result.to_export();
    let text = payload.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["schema_version"], "1.1");
    assert_eq!(value["parse_result"]["success"], true);
    assert_eq!(value["validation_result"]["valid"], false);
    assert_eq!(value["validation_result"]["error_count"], 10);
    assert_eq!(value["validation_result"]["checks_run"].as_array().unwrap().len(), 14);
    assert_eq!(value["parse_result"]["board"]["components"]["C1"]["placement"]["rotation"], 400.0);
}

#[test]
fn test_export_for_parse_failure() {
    let err = boardguard::parse_board(&fixture_path("truncated.json")).unwrap_err();
    let payload = ExportPayload::from_parse_error("truncated.json", &err);
    assert!(!payload.parse_result.success);
    assert!(payload.parse_result.board.is_none());
    assert!(payload.validation_result.checks_run.is_empty());
}

#[test]
fn test_validate_from_scratch_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let text = std::fs::read_to_string(fixture_path("empty_board.json")).unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let options = ValidationOptions {
        strict_mode: false,
        rules: vec!["empty_board".into(), "missing_boundary".into()],
    };
    let result = BoardGuardCore::validate_file(file.path(), &options).unwrap();
    assert_eq!(result.checks_run, vec!["missing_boundary", "empty_board"]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::EmptyBoard);
}
