//! Reference resolution
//!
//! Finds every textual occurrence of a declared identifier anywhere in its
//! file and classifies each as a read or a write. Matching is by identifier
//! text only, not by scope or symbol identity: two same-named variables in
//! one file share reference rows. This mirrors the audit's documented
//! whole-file matching behavior.

use std::fmt;

use tree_sitter::Node;

use crate::syntax::{preorder, SourceUnit};

/// How an occurrence uses the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "Read"),
            Operation::Write => write!(f, "Write"),
        }
    }
}

/// One textual occurrence of a declared identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub line: usize,
    pub operation: Operation,
}

/// All occurrences of `name` in the file, in appearance order.
///
/// An occurrence is a Write iff it is the left operand of a simple `=`
/// assignment. Compound assignment and increment/decrement targets,
/// `ref`/`out` arguments and every other position are reads. Identifiers
/// that are themselves a declared name (declarator, member or parameter
/// name) are not occurrences.
pub fn find_references(unit: &SourceUnit, name: &str) -> Vec<Reference> {
    let mut references = Vec::new();
    preorder(unit.root(), &mut |node| {
        if node.kind() != "identifier" || unit.text(node) != name {
            return;
        }
        if is_declared_name(node) {
            return;
        }
        references.push(Reference {
            line: unit.line(node),
            operation: classify(unit, node),
        });
    });
    references
}

/// Declaration constructs whose `name` field is the declared name itself
/// rather than a use of it.
const NAMED_DECLARATIONS: &[&str] = &[
    "variable_declarator",
    "class_declaration",
    "interface_declaration",
    "struct_declaration",
    "enum_declaration",
    "enum_member_declaration",
    "record_declaration",
    "method_declaration",
    "constructor_declaration",
    "destructor_declaration",
    "property_declaration",
    "event_declaration",
    "delegate_declaration",
    "local_function_statement",
    "parameter",
    "type_parameter",
    "catch_declaration",
];

fn is_declared_name(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let field = match parent.kind() {
        // The iteration variable is a declaration, not a use. Grammar
        // versions disagree on the node's spelling.
        "foreach_statement" | "for_each_statement" => "left",
        kind if NAMED_DECLARATIONS.contains(&kind) => "name",
        _ => return false,
    };
    parent
        .child_by_field_name(field)
        .is_some_and(|n| n.id() == node.id())
}

fn classify(unit: &SourceUnit, node: Node<'_>) -> Operation {
    let Some(parent) = node.parent() else {
        return Operation::Read;
    };
    if parent.kind() != "assignment_expression" {
        return Operation::Read;
    }
    let is_left_operand = parent
        .child_by_field_name("left")
        .is_some_and(|left| left.id() == node.id());
    if is_left_operand && is_simple_assignment(unit, parent) {
        Operation::Write
    } else {
        Operation::Read
    }
}

/// True when the assignment operator is plain `=`. Compound operators
/// (`+=`, `??=`, ...) keep their target classified as a read.
fn is_simple_assignment(unit: &SourceUnit, assignment: Node<'_>) -> bool {
    let operator = assignment.child_by_field_name("operator").or_else(|| {
        let mut cursor = assignment.walk();
        let found = assignment
            .children(&mut cursor)
            .find(|c| c.kind() == "assignment_operator");
        found
    });
    operator.is_some_and(|op| unit.text(op) == "=")
}
