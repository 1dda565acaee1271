//! Resolved display names for declared types
//!
//! The report carries the *converted* display name of a declared type, not
//! the literal source token: framework aliases collapse to their C# keyword
//! form (`String` -> `string`), `var` is resolved from the initializer when
//! the initializer's type is syntactically evident, and whitespace inside
//! generic argument lists is normalized.

use tree_sitter::Node;

use crate::syntax::SourceUnit;

/// Display name for the type declared by `type_node`.
///
/// `declarator` is the first declarator of the statement; it supplies the
/// initializer used to resolve `var`.
pub fn resolve_display_type(
    unit: &SourceUnit,
    type_node: Node<'_>,
    declarator: Option<Node<'_>>,
) -> String {
    let raw = unit.text(type_node);
    if type_node.kind() == "implicit_type" || raw == "var" {
        if let Some(declarator) = declarator {
            if let Some(inferred) = infer_from_initializer(unit, declarator) {
                return inferred;
            }
        }
        return "var".to_string();
    }
    normalize_type_text(raw)
}

/// Resolve `var` from the declarator's initializer expression, if the
/// initializer names its own type.
fn infer_from_initializer(unit: &SourceUnit, declarator: Node<'_>) -> Option<String> {
    let init = initializer_of(declarator)?;
    match init.kind() {
        "integer_literal" => Some(integer_display(unit.text(init))),
        "real_literal" => Some(real_display(unit.text(init))),
        "boolean_literal" => Some("bool".to_string()),
        "character_literal" => Some("char".to_string()),
        "string_literal"
        | "verbatim_string_literal"
        | "raw_string_literal"
        | "interpolated_string_expression" => Some("string".to_string()),
        "object_creation_expression"
        | "array_creation_expression"
        | "cast_expression"
        | "default_expression" => init
            .child_by_field_name("type")
            .map(|t| normalize_type_text(unit.text(t))),
        _ => None,
    }
}

/// The expression a declarator is initialized with: the first named child
/// after the declared name.
fn initializer_of(declarator: Node<'_>) -> Option<Node<'_>> {
    let name = declarator.child_by_field_name("name");
    let mut cursor = declarator.walk();
    let found = declarator
        .named_children(&mut cursor)
        .find(|child| Some(child.id()) != name.as_ref().map(|n| n.id()));
    found
}

fn integer_display(literal: &str) -> String {
    let suffix: String = literal
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    match suffix.as_str() {
        "lu" | "ul" => "ulong",
        "l" => "long",
        "u" => "uint",
        _ => "int",
    }
    .to_string()
}

fn real_display(literal: &str) -> String {
    match literal.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('f') => "float",
        Some('m') => "decimal",
        _ => "double",
    }
    .to_string()
}

/// Normalize a type's source text into its display form: whitespace
/// collapsed, `, ` between generic arguments, framework aliases replaced by
/// their keyword form.
pub fn normalize_type_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let mut segment = String::new();
    for c in compact.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            segment.push(c);
            continue;
        }
        flush_segment(&mut out, &mut segment);
        out.push(c);
        if c == ',' {
            out.push(' ');
        }
    }
    flush_segment(&mut out, &mut segment);
    out
}

fn flush_segment(out: &mut String, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    out.push_str(alias_for(segment).unwrap_or(segment));
    segment.clear();
}

/// Keyword form of a framework type name, if it has one.
fn alias_for(name: &str) -> Option<&'static str> {
    let bare = name.strip_prefix("System.").unwrap_or(name);
    // Names containing further dots are not framework aliases.
    if bare.contains('.') {
        return None;
    }
    Some(match bare {
        "Boolean" => "bool",
        "Byte" => "byte",
        "SByte" => "sbyte",
        "Char" => "char",
        "Decimal" => "decimal",
        "Double" => "double",
        "Single" => "float",
        "Int32" => "int",
        "UInt32" => "uint",
        "Int64" => "long",
        "UInt64" => "ulong",
        "Int16" => "short",
        "UInt16" => "ushort",
        "Object" => "object",
        "String" => "string",
        _ => return None,
    })
}
