//! Example: extending the RulesEngine with a board-specific check.
//! Run with: cargo run --example custom_rules [path/to/board.json]

use boardguard::{
    parse_board, Board, BoardParseError, ErrorCode, Rule, RuleContext, RulesEngine, Severity,
    ValidationError,
};
use std::path::Path;
use std::sync::Arc;

/// Flags traces narrower than the fab's minimum width.
struct MinTraceWidth {
    min_mm: f64,
}

impl Rule for MinTraceWidth {
    fn id(&self) -> &str {
        "min_trace_width"
    }

    fn name(&self) -> &str {
        "Fab Minimum Trace Width"
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::NegativeWidth
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, board: &Board, _ctx: &RuleContext, errors: &mut Vec<ValidationError>) {
        for (id, trace) in &board.traces {
            if trace.width > 0.0 && trace.width < self.min_mm {
                errors.push(
                    ValidationError::new(
                        self.code(),
                        format!("Trace {} is narrower than {} mm", id, self.min_mm),
                        format!("$.traces.{}.width", id),
                    )
                    .with_context("trace_id", id.clone())
                    .with_context("width", trace.width),
                );
            }
        }
    }
}

fn main() -> Result<(), BoardParseError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/valid_board.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/board.json]");
        std::process::exit(1);
    }

    let board = parse_board(path)?;
    let mut engine = RulesEngine::with_default_rules();
    engine.add_rule(Arc::new(MinTraceWidth { min_mm: 0.254 }));
    let findings = engine.validate(&board);

    println!("Custom validation found {} findings for {}", findings.len(), path.display());
    for finding in &findings {
        println!("  {}", finding);
    }

    let errors = findings.iter().filter(|f| f.is_error()).count();
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
