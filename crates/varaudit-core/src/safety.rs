//! Thread-safety heuristic
//!
//! A fixed rule set over declared modifiers and attribute names. This is a
//! surface heuristic, not a soundness analysis: it consults no lock
//! statements, no immutability information, and nothing in method bodies.

use crate::decl::DeclKind;

/// Apparent thread-safety of a declaration.
///
/// - fields: `static` or `volatile` modifier present;
/// - properties: an attached attribute whose name contains `ThreadStatic`
///   or `ThreadLocal`;
/// - local variables: never.
pub fn is_thread_safe(kind: DeclKind, modifiers: &[String], attributes: &[String]) -> bool {
    match kind {
        DeclKind::LocalVariable => false,
        DeclKind::Field | DeclKind::StaticField => modifiers
            .iter()
            .any(|m| m == "static" || m == "volatile"),
        DeclKind::Property => attributes
            .iter()
            .any(|a| a.contains("ThreadStatic") || a.contains("ThreadLocal")),
    }
}
