//! Versioned export payload read by downstream reporting tools.
//!
//! The shape is a public contract. New fields may be added; existing ones
//! are never renamed or removed without bumping [`SCHEMA_VERSION`]. Board
//! thickness moved to millimeters in 1.1 as `total_thickness_mm`; the 1.0
//! `total_thickness_um` key is still written next to it.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{BoardParseError, Severity, ValidationError};
use crate::parser::schema::Board;
use crate::stats::BoardStats;

pub const SCHEMA_VERSION: &str = "1.1";

#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub success: bool,
    pub errors: Vec<ValidationError>,
    pub board: Option<Board>,
    pub stats: Option<BoardStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    /// No ERROR-severity findings.
    pub valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<ValidationError>,
    /// WARNING and INFO findings.
    pub warnings: Vec<ValidationError>,
    pub checks_run: Vec<String>,
}

impl ValidationSummary {
    pub fn from_findings(findings: &[ValidationError], checks_run: Vec<String>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .iter()
            .cloned()
            .partition(|e| e.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            error_count: errors.len(),
            warning_count: warnings.len(),
            errors,
            warnings,
            checks_run,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportPayload {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: String,
    pub input_file: String,
    pub parse_result: ParseResult,
    pub validation_result: ValidationSummary,
}

impl ExportPayload {
    /// Payload for a board that parsed, with the findings of one validation pass.
    pub fn from_board(
        input_file: impl Into<String>,
        board: &Board,
        findings: &[ValidationError],
        checks_run: Vec<String>,
    ) -> Self {
        let stats = BoardStats::compute(board);
        Self::stamped(
            input_file.into(),
            ParseResult {
                success: true,
                errors: Vec::new(),
                board: Some(board.clone()),
                stats: Some(stats),
            },
            ValidationSummary::from_findings(findings, checks_run),
        )
    }

    /// Payload for a terminal parse failure. No checks run.
    pub fn from_parse_error(input_file: impl Into<String>, error: &BoardParseError) -> Self {
        let parse_errors = vec![error.to_validation_error()];
        let validation = ValidationSummary::from_findings(&parse_errors, Vec::new());
        Self::stamped(
            input_file.into(),
            ParseResult {
                success: false,
                errors: parse_errors,
                board: None,
                stats: None,
            },
            validation,
        )
    }

    fn stamped(
        input_file: String,
        parse_result: ParseResult,
        validation_result: ValidationSummary,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            input_file,
            parse_result,
            validation_result,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::parser::BoardParser;
    use serde_json::json;

    fn board() -> Board {
        BoardParser::parse_board_value(&json!({
            "metadata": {"designUnits": "MILLIMETER"},
            "boundary": {"coordinates": [[0, 0], [10, 0], [10, 10], [0, 10]]},
            "stackup": {"layers": [
                {"name": "TOP", "layer_type": "TOP", "index": 0, "material": {}},
                {"name": "BOTTOM", "layer_type": "BOTTOM", "index": 1, "material": {}}
            ]},
            "nets": ["GND"],
            "components": {"R1": {"transform": {"position": [5, 5]}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_success_payload_shape() {
        let findings = vec![
            ValidationError::new(ErrorCode::EmptyBoard, "empty", "$"),
            ValidationError::new(ErrorCode::DanglingTrace, "dangling", "$.traces.T1")
                .with_severity(Severity::Warning),
        ];
        let payload = ExportPayload::from_board(
            "board.json",
            &board(),
            &findings,
            vec!["empty_board".into(), "dangling_trace".into()],
        );
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["schema_version"], "1.1");
        assert_eq!(value["input_file"], "board.json");
        assert!(Uuid::parse_str(value["run_id"].as_str().unwrap()).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(value["generated_at"].as_str().unwrap()).is_ok());

        assert_eq!(value["parse_result"]["success"], true);
        assert_eq!(value["parse_result"]["errors"], json!([]));
        assert_eq!(value["parse_result"]["stats"]["num_components"], 1);
        assert!(value["parse_result"]["board"].is_object());

        let v = &value["validation_result"];
        assert_eq!(v["valid"], false);
        assert_eq!(v["error_count"], 1);
        assert_eq!(v["warning_count"], 1);
        assert_eq!(v["errors"][0]["code"], "EMPTY_BOARD");
        assert_eq!(v["warnings"][0]["code"], "DANGLING_TRACE");
        assert_eq!(v["checks_run"], json!(["empty_board", "dangling_trace"]));
    }

    #[test]
    fn test_parse_failure_payload() {
        let err = BoardParseError::MalformedJson("expected value at line 1".into());
        let payload = ExportPayload::from_parse_error("bad.json", &err);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["parse_result"]["success"], false);
        assert!(value["parse_result"]["board"].is_null());
        assert!(value["parse_result"]["stats"].is_null());
        assert_eq!(value["parse_result"]["errors"][0]["code"], "MALFORMED_JSON");
        assert_eq!(value["validation_result"]["valid"], false);
        assert_eq!(value["validation_result"]["checks_run"], json!([]));
    }

    #[test]
    fn test_run_ids_differ() {
        let b = board();
        let a = ExportPayload::from_board("a.json", &b, &[], vec![]);
        let c = ExportPayload::from_board("a.json", &b, &[], vec![]);
        assert_ne!(a.run_id, c.run_id);
        assert!(a.validation_result.valid);
    }
}
