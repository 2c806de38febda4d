//! Structured diagnostics.
//!
//! Every finding, whether it stops parsing or comes out of the validation
//! engine, is reported as a [`ValidationError`] with a stable JSON shape:
//! `{code, severity, message, json_path, context}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Every diagnostic code the system can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // terminal parse failures
    MalformedJson,
    FileIoError,
    ParseError,
    InvalidUnitSpecification,
    // validation findings
    MissingBoundary,
    MalformedCoordinates,
    SelfIntersectingBoundary,
    MalformedStackup,
    EmptyBoard,
    InvalidRotation,
    ComponentOutsideBoundary,
    InvalidPinReference,
    MalformedTrace,
    NegativeWidth,
    NonexistentNet,
    NonexistentLayer,
    DanglingTrace,
    InvalidViaGeometry,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MalformedJson => "MALFORMED_JSON",
            ErrorCode::FileIoError => "FILE_IO_ERROR",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InvalidUnitSpecification => "INVALID_UNIT_SPECIFICATION",
            ErrorCode::MissingBoundary => "MISSING_BOUNDARY",
            ErrorCode::MalformedCoordinates => "MALFORMED_COORDINATES",
            ErrorCode::SelfIntersectingBoundary => "SELF_INTERSECTING_BOUNDARY",
            ErrorCode::MalformedStackup => "MALFORMED_STACKUP",
            ErrorCode::EmptyBoard => "EMPTY_BOARD",
            ErrorCode::InvalidRotation => "INVALID_ROTATION",
            ErrorCode::ComponentOutsideBoundary => "COMPONENT_OUTSIDE_BOUNDARY",
            ErrorCode::InvalidPinReference => "INVALID_PIN_REFERENCE",
            ErrorCode::MalformedTrace => "MALFORMED_TRACE",
            ErrorCode::NegativeWidth => "NEGATIVE_WIDTH",
            ErrorCode::NonexistentNet => "NONEXISTENT_NET",
            ErrorCode::NonexistentLayer => "NONEXISTENT_LAYER",
            ErrorCode::DanglingTrace => "DANGLING_TRACE",
            ErrorCode::InvalidViaGeometry => "INVALID_VIA_GEOMETRY",
        }
    }

    /// Codes that abort before a board model exists.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorCode::MalformedJson
                | ErrorCode::FileIoError
                | ErrorCode::ParseError
                | ErrorCode::InvalidUnitSpecification
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        })
    }
}

/// A single structured finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// Location of the offending field, e.g. `$.traces.T1.width`.
    pub json_path: String,
    /// Offending values and, for reference errors, the valid alternatives.
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

impl ValidationError {
    /// New finding with `Severity::Error` and an empty context.
    pub fn new(code: ErrorCode, message: impl Into<String>, json_path: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            json_path: json_path.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} at {}",
            self.severity, self.code, self.message, self.json_path
        )?;
        if !self.context.is_empty() {
            let ctx = serde_json::to_string(&self.context).map_err(|_| fmt::Error)?;
            write!(f, " context={}", ctx)?;
        }
        Ok(())
    }
}

/// Terminal failures that happen before a board model exists.
#[derive(Debug, Error)]
pub enum BoardParseError {
    #[error("Cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    MalformedJson(String),

    #[error("Unknown designUnits: {token}")]
    InvalidUnits { token: String },

    #[error("Failed to parse board: {0}")]
    Parse(String),
}

impl BoardParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BoardParseError::Io(_) => ErrorCode::FileIoError,
            BoardParseError::MalformedJson(_) => ErrorCode::MalformedJson,
            BoardParseError::InvalidUnits { .. } => ErrorCode::InvalidUnitSpecification,
            BoardParseError::Parse(_) => ErrorCode::ParseError,
        }
    }

    /// The single structured error reported for this failure.
    pub fn to_validation_error(&self) -> ValidationError {
        match self {
            BoardParseError::InvalidUnits { token } => {
                ValidationError::new(self.code(), self.to_string(), "$.metadata.designUnits")
                    .with_context("designUnits", token.clone())
                    .with_context("valid_units", vec!["MICRON", "MILLIMETER"])
            }
            _ => ValidationError::new(self.code(), self.to_string(), "$"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_serializes_as_screaming_snake() {
        assert_eq!(
            serde_json::to_value(ErrorCode::InvalidViaGeometry).unwrap(),
            json!("INVALID_VIA_GEOMETRY")
        );
        assert_eq!(ErrorCode::DanglingTrace.as_str(), "DANGLING_TRACE");
    }

    #[test]
    fn test_validation_error_shape() {
        let err = ValidationError::new(ErrorCode::NegativeWidth, "Trace T1 width must be positive", "$.traces.T1.width")
            .with_context("trace_id", "T1")
            .with_context("width", -0.1);
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "NEGATIVE_WIDTH");
        assert_eq!(value["severity"], "ERROR");
        assert_eq!(value["json_path"], "$.traces.T1.width");
        assert_eq!(value["context"]["width"], json!(-0.1));
        for key in ["code", "severity", "message", "json_path", "context"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new(ErrorCode::EmptyBoard, "Board has no components, traces or vias", "$");
        assert_eq!(
            err.to_string(),
            "[ERROR] EMPTY_BOARD: Board has no components, traces or vias at $"
        );
    }

    #[test]
    fn test_parse_error_codes() {
        let io = BoardParseError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.code(), ErrorCode::FileIoError);
        assert!(io.code().is_terminal());

        let units = BoardParseError::InvalidUnits { token: "INCH".into() };
        let err = units.to_validation_error();
        assert_eq!(err.code, ErrorCode::InvalidUnitSpecification);
        assert_eq!(err.json_path, "$.metadata.designUnits");
        assert_eq!(err.context["designUnits"], json!("INCH"));
    }
}
