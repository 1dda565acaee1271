//! Optional audit trace log
//!
//! When enabled, writes a timestamped trace of the scan (files, classes,
//! row counts) to a log file for verification of large runs. Disabled by
//! default; the audit itself never depends on it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global logger instance
static LOGGER: Mutex<Option<AuditLogger>> = Mutex::new(None);

/// Logger for audit runs
pub struct AuditLogger {
    file: File,
}

impl AuditLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self { file })
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    /// Log a section header
    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::env::temp_dir().join(format!("varaudit-{}.log", timestamp))
    });

    let logger = AuditLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

/// Log a message to the global logger
pub fn log(message: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.log(message);
        }
    }
}

/// Log a section header
pub fn section(title: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.section(title);
        }
    }
}

/// Check if logging is enabled
pub fn is_enabled() -> bool {
    if let Ok(guard) = LOGGER.lock() {
        guard.is_some()
    } else {
        false
    }
}

/// Log scan start
pub fn log_scan_start(root: &Path, files_count: usize) {
    section("SCAN START");
    log(&format!("Input: {}", root.display()));
    log(&format!("Candidate files: {}", files_count));
}

/// Log one scanned file
pub fn log_file(path: &Path, classes: usize, rows: usize) {
    log(&format!(
        "{}: {} classes, {} rows",
        path.display(),
        classes,
        rows
    ));
}

/// Log a skipped file with the reason
pub fn log_skip(path: &Path, reason: &str) {
    log(&format!("SKIPPED {}: {}", path.display(), reason));
}

/// Log scan completion
pub fn log_scan_complete(files: usize, skipped: usize, rows: usize) {
    section("SCAN COMPLETE");
    log(&format!("Files audited: {}", files));
    log(&format!("Files skipped: {}", skipped));
    log(&format!("Rows emitted: {}", rows));
}
