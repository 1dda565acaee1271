//! varaudit CLI - variable usage audit for C# codebases
//!
//! Scans a directory tree of C# sources and writes a flat CSV with one row
//! per declared variable (field, static field, property, local variable)
//! and one row per read/write reference to it, annotated with a
//! thread-safety heuristic.

mod config;
mod report;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::*;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::ExitCode;

use config::Config;
use varaudit_core::{logging, AuditConfig, AuditError, AuditReport, Auditor};

#[derive(Parser)]
#[command(name = "varaudit")]
#[command(version = "0.1.0")]
#[command(about = "Variable usage audit for C# codebases")]
struct Cli {
    /// Directory or file to analyze (falls back to configuration)
    input: Option<PathBuf>,

    /// Destination CSV file (falls back to configuration)
    output: Option<PathBuf>,

    /// File pattern to audit, e.g. "*.cs" (falls back to configuration)
    pattern: Option<String>,

    /// Path to config file (default: auto-detect .varaudit.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// Additional preprocessor symbol (can be given multiple times)
    #[arg(long, short = 'D', value_name = "SYMBOL")]
    define: Vec<String>,

    /// Write a trace log (to PATH, or a temp file when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    log: Option<Option<PathBuf>>,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load config file
    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        if cli.verbose {
            println!("{}: {}", "Using config".bold(), config_path.display());
        }
        cfg
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                if cli.verbose {
                    println!("{}: {}", "Using config".bold(), path.display());
                }
                cfg
            }
            None => Config::default(),
        }
    };

    // Positional arguments win over configuration defaults.
    let input = cli.input.or(config.paths.input);
    let output = cli.output.or(config.output.file);
    let (input, output) = match (input, output) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            eprintln!(
                "{}: Missing required arguments: input path and output file.",
                "Error".red()
            );
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        }
    };
    let pattern = cli
        .pattern
        .or(config.files.pattern)
        .unwrap_or_else(|| "*.cs".to_string());

    if let Some(log) = &cli.log {
        let log_path = logging::init_logger(log.as_deref())?;
        if cli.verbose {
            println!("{}: {}", "Trace log".bold(), log_path.display());
        }
    }

    let mut preprocessor_symbols = config.parse.preprocessor_symbols;
    preprocessor_symbols.extend(cli.define);

    let auditor = Auditor::new(AuditConfig {
        file_pattern: pattern,
        preprocessor_symbols,
        exclude: config.paths.exclude,
    });

    if cli.verbose {
        println!(
            "{}: {} -> {}",
            "Auditing".bold(),
            input.display(),
            output.display()
        );
    }

    match audit_and_write(&auditor, &input, &output) {
        Ok(report) => {
            println!("{}", "File written successfully.".green());
            if cli.verbose {
                print_summary(&report);
            }
        }
        Err(e) => print_categorized_error(&e),
    }

    // I/O failures are reported above; both paths terminate normally.
    Ok(ExitCode::SUCCESS)
}

fn audit_and_write(
    auditor: &Auditor,
    input: &std::path::Path,
    output: &std::path::Path,
) -> Result<AuditReport, AuditError> {
    let report = auditor.audit_paths(input)?;
    report::write_report(output, &report)?;
    Ok(report)
}

/// Map boundary failures to the three categorized console messages.
fn print_categorized_error(error: &AuditError) {
    let message = match error {
        AuditError::Io(e) => match e.kind() {
            ErrorKind::PermissionDenied => {
                format!("Access to the path is denied. {}", e)
            }
            ErrorKind::NotFound => format!("The specified path is invalid. {}", e),
            _ => format!("An I/O error occurred. {}", e),
        },
        other => format!("An I/O error occurred. {}", other),
    };
    eprintln!("{}: {}", "Error".red(), message);
}

fn print_summary(report: &AuditReport) {
    println!(
        "{}: {} files audited, {} skipped, {} rows",
        "Summary".bold(),
        report.file_count(),
        report.skipped,
        report.row_count()
    );
}
