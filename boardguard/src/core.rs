//! Core validation pipeline shared by the CLI and library callers.
//! Load, parse, validate and summarize one board description.

use std::path::{Path, PathBuf};

use crate::analyzer::rules::RulesEngine;
use crate::errors::{BoardParseError, Severity, ValidationError};
use crate::export::ExportPayload;
use crate::parser::board::BoardParser;
use crate::parser::schema::Board;
use crate::scene::ConfigError;
use crate::stats::BoardStats;

#[derive(Debug, thiserror::Error)]
pub enum BoardGuardError {
    #[error(transparent)]
    Parse(#[from] BoardParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Unknown check: {0}")]
    UnknownRule(String),
}

/// Options for validation runs.
#[derive(Clone, Debug)]
pub struct ValidationOptions {
    /// Treat any ERROR finding as blocking. Read by callers, not by the engine.
    pub strict_mode: bool,
    /// Restrict the run to these check ids. Empty runs all of them.
    pub rules: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_mode: true,
            rules: vec![],
        }
    }
}

impl ValidationOptions {
    /// Engine with the default checks, narrowed to `rules`.
    pub fn engine(&self) -> Result<RulesEngine, BoardGuardError> {
        let mut engine = RulesEngine::with_default_rules();
        let known = engine.rule_ids();
        if let Some(unknown) = self.rules.iter().find(|r| !known.contains(r)) {
            return Err(BoardGuardError::UnknownRule(unknown.clone()));
        }
        engine.retain_ids(&self.rules);
        Ok(engine)
    }
}

/// Per-file validation result with findings and counts.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub file: PathBuf,
    pub board: Board,
    pub errors: Vec<ValidationError>,
    pub stats: ValidationStats,
    pub checks_run: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl ValidationStats {
    pub fn from_findings(findings: &[ValidationError]) -> Self {
        let mut stats = Self::default();
        for f in findings {
            match f.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.info += 1,
            }
        }
        stats
    }
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.errors + self.stats.warnings + self.stats.info
    }

    /// Whether the result stops further processing under the given policy.
    pub fn blocks(&self, strict: bool) -> bool {
        strict && self.has_errors()
    }

    pub fn board_stats(&self) -> BoardStats {
        BoardStats::compute(&self.board)
    }

    pub fn to_export(&self) -> ExportPayload {
        ExportPayload::from_board(
            self.file.display().to_string(),
            &self.board,
            &self.errors,
            self.checks_run.clone(),
        )
    }
}

/// Core validation API.
pub struct BoardGuardCore;

impl BoardGuardCore {
    /// Read and parse a board file, logging terminal failures.
    pub fn load_board(path: &Path) -> Result<Board, BoardParseError> {
        BoardParser::parse_board(path).map_err(|e| {
            tracing::warn!(file = %path.display(), code = %e.code(), "{}", e);
            e
        })
    }

    /// Validate a single board file.
    pub fn validate_file(
        path: &Path,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, BoardGuardError> {
        let engine = options.engine()?;
        let board = Self::load_board(path)?;
        Ok(Self::run(path.to_path_buf(), board, &engine))
    }

    /// Validate an already parsed board.
    pub fn validate_board(
        board: Board,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, BoardGuardError> {
        let engine = options.engine()?;
        Ok(Self::run(PathBuf::new(), board, &engine))
    }

    fn run(file: PathBuf, board: Board, engine: &RulesEngine) -> ValidationResult {
        let errors = engine.validate(&board);
        let stats = ValidationStats::from_findings(&errors);
        ValidationResult {
            file,
            board,
            errors,
            stats,
            checks_run: engine.rule_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;
    use std::io::Write;

    fn write_board(value: &serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    fn empty_board() -> serde_json::Value {
        json!({
            "metadata": {"designUnits": "MILLIMETER"},
            "boundary": {"coordinates": [[0, 0], [10, 0], [10, 10], [0, 10]]},
            "stackup": {"layers": [
                {"name": "TOP", "layer_type": "TOP", "index": 0, "material": {}},
                {"name": "BOTTOM", "layer_type": "BOTTOM", "index": 1, "material": {}}
            ]},
            "nets": []
        })
    }

    #[test]
    fn test_validate_file() {
        let file = write_board(&empty_board());
        let result = BoardGuardCore::validate_file(file.path(), &ValidationOptions::default()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::EmptyBoard);
        assert_eq!(result.stats, ValidationStats { errors: 1, warnings: 0, info: 0 });
        assert!(result.blocks(true));
        assert!(!result.blocks(false));
        assert_eq!(result.checks_run.len(), 14);
    }

    #[test]
    fn test_rule_filter() {
        let file = write_board(&empty_board());
        let options = ValidationOptions {
            strict_mode: true,
            rules: vec!["missing_boundary".into()],
        };
        let result = BoardGuardCore::validate_file(file.path(), &options).unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(result.checks_run, vec!["missing_boundary".to_string()]);
    }

    #[test]
    fn test_unknown_rule() {
        let options = ValidationOptions {
            strict_mode: true,
            rules: vec!["no_such_check".into()],
        };
        assert!(matches!(
            options.engine(),
            Err(BoardGuardError::UnknownRule(name)) if name == "no_such_check"
        ));
    }

    #[test]
    fn test_parse_failure_is_terminal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = BoardGuardCore::validate_file(file.path(), &ValidationOptions::default()).unwrap_err();
        match err {
            BoardGuardError::Parse(e) => assert_eq!(e.code(), ErrorCode::MalformedJson),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = BoardGuardCore::load_board(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileIoError);
    }
}
