//! BoardGuard - validation and coordinate transforms for JSON PCB descriptions
//!
//! This library reads a board description (outline, stackup, nets,
//! components, traces, vias, pours, keepouts), normalizes it to
//! millimeters, runs a fixed, ordered set of structural checks that collect
//! every problem instead of stopping at the first, and maps the geometry
//! from ECAD space (Y up) into draw space (Y down) for rendering.
//!
//! # Quick Start
//!
//! ```no_run
//! use boardguard::{BoardGuardCore, ValidationOptions};
//! use std::path::Path;
//!
//! let options = ValidationOptions::default();
//! let result = BoardGuardCore::validate_file(Path::new("board.json"), &options).unwrap();
//!
//! for error in &result.errors {
//!     println!("{}", error);
//! }
//! ```
//!
//! # Features
//!
//! - **Unit normalization**: MICRON and MILLIMETER inputs, one canonical unit
//! - **Validation**: 14 checks with structured `{code, severity, message, json_path, context}` findings
//! - **Connectivity**: same-net reachability for dangling trace detection
//! - **Transforms**: ECAD/draw space, component placement, padded view box
//! - **Export**: versioned JSON payload for downstream reporting

pub mod analyzer;
pub mod core;
pub mod errors;
pub mod export;
pub mod geometry;
pub mod parser;
pub mod scene;
pub mod stats;
pub mod transform;

// Re-export main types
pub use analyzer::rules::{Rule, RuleContext, RulesEngine};
pub use analyzer::{check_names, validate};
pub use crate::core::{BoardGuardCore, BoardGuardError, ValidationOptions, ValidationResult, ValidationStats};
pub use errors::{BoardParseError, ErrorCode, Severity, ValidationError};
pub use export::ExportPayload;
pub use parser::schema::Board;
pub use parser::BoardParser;
pub use scene::{build_scene, RenderConfig, Scene};
pub use stats::BoardStats;

/// Parse a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, BoardParseError> {
    BoardParser::parse_board(path)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, BoardGuardCore, BoardGuardError, ErrorCode, Severity, ValidationError,
        ValidationOptions, ValidationResult, ValidationStats,
    };
}
