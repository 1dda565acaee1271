//! Report writing
//!
//! Serializes an [`AuditReport`] to its destination: the fixed header
//! first, then one `\n`-terminated line per row, in file order.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use varaudit_core::record::CSV_HEADER;
use varaudit_core::AuditReport;

/// Write the report to `path`, creating or truncating the file.
pub fn write_report(path: &Path, report: &AuditReport) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", CSV_HEADER)?;
    for line in report.lines() {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use varaudit_core::Auditor;

    fn sample_report() -> AuditReport {
        let auditor = Auditor::with_defaults();
        let rows = auditor
            .audit_source(
                Path::new("C.cs"),
                "class C\n{\n    private int count;\n    void Run() { count = 1; }\n}\n",
            )
            .unwrap();
        AuditReport {
            files: vec![rows],
            skipped: 0,
        }
    }

    #[test]
    fn test_written_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("report.csv");
        let report = sample_report();
        write_report(&out, &report).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = written.trim_end().split('\n').collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 1 + report.row_count());
        assert!(!written.contains('\r'));
    }

    #[test]
    fn test_empty_report_still_writes_header() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("report.csv");
        write_report(&out, &AuditReport::default()).unwrap();
        let written = fs::read_to_string(&out).unwrap();
        assert_eq!(written, format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_unwritable_destination_is_an_io_error() {
        let out = PathBuf::from("/nonexistent/dir/report.csv");
        let err = write_report(&out, &AuditReport::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
