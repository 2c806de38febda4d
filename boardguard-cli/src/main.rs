//! BoardGuard CLI - PCB board description validation from the command line.

use anyhow::Context;
use boardguard::{
    build_scene, BoardGuardCore, BoardGuardError, BoardParseError, ExportPayload, RenderConfig,
    RulesEngine, Severity, ValidationError, ValidationOptions, ValidationResult,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardguard")]
#[command(about = "PCB board description validation tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a board description file
    Check {
        /// Path to a board .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Report findings but exit successfully unless parsing fails
        #[arg(long)]
        permissive: bool,

        /// Write the versioned export payload to this path
        #[arg(long, value_name = "PATH")]
        export_json: Option<PathBuf>,

        /// Only run these checks (comma separated ids, see `rules`)
        #[arg(long, value_delimiter = ',')]
        rules: Vec<String>,
    },

    /// Print draw-space geometry for a board as JSON
    Scene {
        /// Path to a board .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Render config JSON (padding, layer colours)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List the validation checks in execution order
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Check {
            file,
            format,
            permissive,
            export_json,
            rules,
        } => handle_check(&file, format, permissive, export_json.as_deref(), rules),
        Commands::Scene { file, config } => handle_scene(&file, config.as_deref()),
        Commands::Rules => {
            handle_rules(cli.verbose);
            Ok(0)
        }
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_check(
    file: &Path,
    format: OutputFormat,
    permissive: bool,
    export_json: Option<&Path>,
    rules: Vec<String>,
) -> anyhow::Result<i32> {
    let options = ValidationOptions {
        strict_mode: !permissive,
        rules,
    };

    match BoardGuardCore::validate_file(file, &options) {
        Ok(result) => {
            output_result(&result, format)?;
            if let Some(path) = export_json {
                write_export(path, &result.to_export())?;
            }
            Ok(if result.blocks(options.strict_mode) { 1 } else { 0 })
        }
        Err(BoardGuardError::Parse(e)) => {
            output_parse_error(file, &e, format)?;
            if let Some(path) = export_json {
                write_export(path, &ExportPayload::from_parse_error(file.display().to_string(), &e))?;
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

fn write_export(path: &Path, payload: &ExportPayload) -> anyhow::Result<()> {
    let text = payload.to_json_pretty()?;
    std::fs::write(path, text).with_context(|| format!("writing export to {}", path.display()))?;
    tracing::info!(path = %path.display(), run_id = %payload.run_id, "wrote export payload");
    Ok(())
}

fn output_result(result: &ValidationResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => output_human(result),
        OutputFormat::Json => output_json(&result.file, &result.errors, &result.checks_run)?,
        OutputFormat::Github => output_github(&result.file, &result.errors),
    }
    Ok(())
}

fn output_parse_error(file: &Path, error: &BoardParseError, format: OutputFormat) -> anyhow::Result<()> {
    let record = error.to_validation_error();
    match format {
        OutputFormat::Human => {
            println!("\nFile: {}", file.display());
            println!("{}", "─".repeat(60));
            println!("  Could not parse board:");
            println!("    - {} {}", record.code, record.message);
        }
        OutputFormat::Json => output_json(file, std::slice::from_ref(&record), &[])?,
        OutputFormat::Github => output_github(file, std::slice::from_ref(&record)),
    }
    Ok(())
}

fn output_human(result: &ValidationResult) {
    println!("\nFile: {}", result.file.display());
    println!("{}", "─".repeat(60));

    if result.total_issues() == 0 {
        println!("  No issues found");
        return;
    }

    for (severity, heading) in [
        (Severity::Error, "ERRORS"),
        (Severity::Warning, "WARNINGS"),
        (Severity::Info, "INFO"),
    ] {
        let group: Vec<_> = result.errors.iter().filter(|e| e.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        println!("\n  {}:", heading);
        for error in group {
            println!("    - {} {}", error.code, error.message);
            println!("      at {}", error.json_path);
        }
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", result.stats.errors);
    println!("    Warnings: {}", result.stats.warnings);
    println!("    Info:     {}", result.stats.info);
}

fn output_json(file: &Path, errors: &[ValidationError], checks_run: &[String]) -> anyhow::Result<()> {
    let error_count = errors.iter().filter(|e| e.is_error()).count();
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "valid": error_count == 0,
        "error_count": error_count,
        "warning_count": errors.len() - error_count,
        "errors": errors,
        "checks_run": checks_run,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn severity_to_github(error: &ValidationError) -> &'static str {
    match error.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    }
}

fn output_github(file: &Path, errors: &[ValidationError]) {
    for error in errors {
        println!(
            "::{} file={},title={}::{} ({})",
            severity_to_github(error),
            file.display(),
            error.code,
            error.message.replace('\n', " "),
            error.json_path
        );
    }
}

fn handle_scene(file: &Path, config: Option<&Path>) -> anyhow::Result<i32> {
    let config = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading render config {}", path.display()))?;
            RenderConfig::from_json_str(&text)?
        }
        None => RenderConfig::default(),
    };

    let board = match BoardGuardCore::load_board(file) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(1);
        }
    };
    let scene = build_scene(&board, &config);
    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(0)
}

fn handle_rules(verbose: bool) {
    println!("Validation checks (in execution order):\n");

    let engine = RulesEngine::with_default_rules();
    for rule in engine.rules() {
        println!("  {}", rule.id());
        println!("    {}", rule.name());
        if verbose {
            println!("    code: {}", rule.code());
        }
        println!();
    }
}
