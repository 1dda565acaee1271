//! varaudit-core: variable usage extraction for C# codebases
//!
//! This crate provides the audit engine:
//!
//! - Walking a source tree with pattern and exclusion filtering
//! - Parsing each file (preprocessor symbols honored) via tree-sitter
//! - Collecting field, property and local-variable declarations per class
//! - Classifying apparent thread-safety from modifiers and attributes
//! - Resolving every textual reference to a declared name as read or write
//! - Assembling the flat CSV row set
//!
//! # Example
//!
//! ```no_run
//! use varaudit_core::{AuditConfig, Auditor};
//! use std::path::Path;
//!
//! let auditor = Auditor::new(AuditConfig::default());
//! let report = auditor.audit_paths(Path::new("src/")).unwrap();
//! for line in report.lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod decl;
pub mod logging;
pub mod record;
pub mod refs;
pub mod safety;
pub mod syntax;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use regex::RegexBuilder;
use walkdir::WalkDir;

use record::OutputRow;
use syntax::{ParseOptions, SourceUnit};

/// Path keywords that mark generated or build-artifact files. Matched
/// case-insensitively against the whole path.
const EXCLUDED_PATH_PATTERN: &str =
    r"\b(site-packages|bin|obj|designer|generated|assemblyinfo|temporarygeneratedfile|app|xaml)\b|\.g\.";

/// Settings for one audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// File name pattern, e.g. `*.cs`.
    pub file_pattern: String,
    /// Symbols defined for preprocessor evaluation.
    pub preprocessor_symbols: Vec<String>,
    /// Additional glob-style exclusion patterns beyond the built-in
    /// generated-code keywords.
    pub exclude: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            file_pattern: "*.cs".to_string(),
            preprocessor_symbols: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Rows produced for one file.
#[derive(Debug)]
pub struct FileRows {
    pub path: PathBuf,
    pub rows: Vec<OutputRow>,
}

/// The assembled result of an audit run, in input file order.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub files: Vec<FileRows>,
    pub skipped: usize,
}

impl AuditReport {
    pub fn rows(&self) -> impl Iterator<Item = &OutputRow> {
        self.files.iter().flat_map(|f| f.rows.iter())
    }

    /// CSV lines for every row, in emission order (header not included).
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rows().map(OutputRow::to_csv_line)
    }

    pub fn row_count(&self) -> usize {
        self.files.iter().map(|f| f.rows.len()).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Errors that can occur during an audit
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] syntax::ParseError),
}

/// Main entry point: walks, parses and assembles rows.
pub struct Auditor {
    config: AuditConfig,
    exclude_re: Option<regex::Regex>,
    parse_options: ParseOptions,
}

impl Auditor {
    /// Create a new auditor with the given configuration
    pub fn new(config: AuditConfig) -> Self {
        let exclude_re = RegexBuilder::new(EXCLUDED_PATH_PATTERN)
            .case_insensitive(true)
            .build()
            .ok();
        let parse_options = ParseOptions {
            preprocessor_symbols: config.preprocessor_symbols.clone(),
        };
        Self {
            config,
            exclude_re,
            parse_options,
        }
    }

    /// Create an auditor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(AuditConfig::default())
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit source code with a given path
    pub fn audit_source(&self, path: &Path, source: &str) -> Result<FileRows, AuditError> {
        let unit = SourceUnit::parse(path, source, &self.parse_options)?;
        let rows = record::assemble(&unit);
        Ok(FileRows {
            path: path.to_path_buf(),
            rows,
        })
    }

    /// Audit a single file
    pub fn audit_file(&self, path: &Path) -> Result<FileRows, AuditError> {
        let source = fs::read_to_string(path)?;
        self.audit_source(path, &source)
    }

    /// Audit a file or directory tree and return the merged report.
    ///
    /// Files are analyzed in parallel; the report keeps them in walk order
    /// so repeated runs produce identical output. A file that cannot be
    /// read or parsed is reported as a warning and skipped.
    pub fn audit_paths(&self, root: &Path) -> Result<AuditReport, AuditError> {
        // Surfaces permission and not-found errors for the root up front.
        let metadata = fs::metadata(root)?;
        let files = if metadata.is_file() {
            vec![root.to_path_buf()]
        } else {
            self.collect_files(root)
        };
        logging::log_scan_start(root, files.len());

        let results: Vec<(PathBuf, Result<FileRows, AuditError>)> = files
            .into_par_iter()
            .map(|file| {
                let result = self.audit_file(&file);
                (file, result)
            })
            .collect();

        let mut report = AuditReport::default();
        for (path, result) in results {
            match result {
                Ok(rows) => {
                    logging::log_file(&path, class_count(&rows), rows.rows.len());
                    report.files.push(rows);
                }
                Err(e) => {
                    eprintln!("Warning: {}: {}", path.display(), e);
                    logging::log_skip(&path, &e.to_string());
                    report.skipped += 1;
                }
            }
        }
        logging::log_scan_complete(report.file_count(), report.skipped, report.row_count());
        Ok(report)
    }

    /// All candidate files under `root`, sorted, filtered by the file
    /// pattern and the exclusion rules.
    pub fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let pattern = glob::Pattern::new(&self.config.file_pattern).ok();
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                pattern.as_ref().map_or(true, |p| p.matches(&name))
            })
            .map(|e| e.into_path())
            .filter(|p| !self.is_excluded(p))
            .collect();
        files.sort();
        files
    }

    /// Check whether a path is excluded from analysis.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self
            .exclude_re
            .as_ref()
            .is_some_and(|re| re.is_match(&path_str))
        {
            return true;
        }
        for pattern in &self.config.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn class_count(rows: &FileRows) -> usize {
    let mut classes: Vec<&str> = rows.rows.iter().map(|r| r.class_name.as_str()).collect();
    classes.dedup();
    classes.len()
}
