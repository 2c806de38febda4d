//! Simple validation example: validate a board description and print results.

use boardguard::prelude::*;
use std::path::Path;

fn main() -> Result<(), BoardGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/valid_board.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_validation [path/to/board.json]");
        std::process::exit(1);
    }

    let options = ValidationOptions::default();
    let result = BoardGuardCore::validate_file(path, &options)?;

    println!("Validation results for: {}", result.file.display());
    println!("Checks run: {}", result.checks_run.len());
    println!("Total findings: {}", result.total_issues());
    println!();

    for error in result.errors.iter().filter(|e| e.severity == Severity::Error) {
        println!("  - {} {}", error.code, error.message);
        println!("    at {}", error.json_path);
    }

    let stats = result.board_stats();
    println!(
        "\nBoard: {:.2} x {:.2} mm, {} components, {} traces, {} vias",
        stats.board_dimensions_mm[0],
        stats.board_dimensions_mm[1],
        stats.num_components,
        stats.num_traces,
        stats.num_vias
    );

    if result.blocks(options.strict_mode) {
        println!("\nValidation failed.");
        std::process::exit(1);
    }

    println!("\nValidation passed.");
    Ok(())
}
