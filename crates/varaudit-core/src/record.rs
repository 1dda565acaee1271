//! Output rows and per-file assembly
//!
//! The report is a flat CSV: the fixed header, then one line per row. Each
//! declaration contributes one row of its own kind followed immediately by
//! one row per reference to it. Commas inside a resolved type name are
//! replaced with `|` before emission so the comma stays a reliable
//! delimiter; the replacement is lossy by design.

use std::fmt;

use crate::decl::{collect_classes, DeclKind, Declaration};
use crate::refs::{find_references, Operation, Reference};
use crate::syntax::SourceUnit;

/// Fixed first line of every report.
pub const CSV_HEADER: &str = "fileName,className,methodName,variables,lineNumber,dataType";

/// Rendered placeholder for declarations without an enclosing method.
const NO_METHOD: &str = "-";

/// What a row describes: a declaration of some kind, or a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Field,
    StaticField,
    Property,
    LocalVariable,
    Reference,
}

impl From<DeclKind> for RowKind {
    fn from(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Field => RowKind::Field,
            DeclKind::StaticField => RowKind::StaticField,
            DeclKind::Property => RowKind::Property,
            DeclKind::LocalVariable => RowKind::LocalVariable,
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RowKind::Field => "Field",
            RowKind::StaticField => "Static Field",
            RowKind::Property => "Property",
            RowKind::LocalVariable => "Local Variable",
            RowKind::Reference => "Reference",
        };
        write!(f, "{label}")
    }
}

/// One serialized record. Immutable once built.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub file: String,
    pub class_name: String,
    pub method_name: String,
    pub identifier: String,
    pub line: usize,
    pub data_type: String,
    pub kind: RowKind,
    pub is_thread_safe: bool,
    /// Present only on `Reference` rows.
    pub operation: Option<Operation>,
}

impl OutputRow {
    fn declaration(file: &str, class_name: &str, decl: &Declaration) -> Self {
        Self {
            file: file.to_string(),
            class_name: class_name.to_string(),
            method_name: decl
                .owning_method
                .clone()
                .unwrap_or_else(|| NO_METHOD.to_string()),
            identifier: decl.name.clone(),
            line: decl.line,
            data_type: decl.declared_type.clone(),
            kind: decl.kind.into(),
            is_thread_safe: decl.is_thread_safe,
            operation: None,
        }
    }

    fn reference(file: &str, class_name: &str, decl: &Declaration, reference: Reference) -> Self {
        Self {
            line: reference.line,
            kind: RowKind::Reference,
            operation: Some(reference.operation),
            ..Self::declaration(file, class_name, decl)
        }
    }

    /// Render the row as one CSV line.
    pub fn to_csv_line(&self) -> String {
        let mut line = format!(
            "{},{},{},{},{},{},{},{}",
            self.file,
            self.class_name,
            self.method_name,
            self.identifier,
            self.line,
            self.data_type.replace(',', "|"),
            self.kind,
            if self.is_thread_safe { "True" } else { "False" },
        );
        if let Some(operation) = self.operation {
            line.push(',');
            line.push_str(&operation.to_string());
        }
        line
    }
}

/// Build the full row block for one parsed file: per class, per
/// declaration, the declaration row then its reference rows.
pub fn assemble(unit: &SourceUnit) -> Vec<OutputRow> {
    let file = unit.path().display().to_string();
    let mut rows = Vec::new();
    for class in collect_classes(unit) {
        for decl in &class.declarations {
            rows.push(OutputRow::declaration(&file, &class.name, decl));
            for reference in find_references(unit, &decl.name) {
                rows.push(OutputRow::reference(&file, &class.name, decl, reference));
            }
        }
    }
    rows
}
