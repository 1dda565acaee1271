//! Declaration collection
//!
//! Walks every class in a parsed file and yields one [`Declaration`] per
//! declared name: fields first (source order, one per co-declared
//! variable), then properties, then every local/method-scoped variable
//! declaration in the class body. Members of nested types belong to the
//! nested type's own scope and are not re-counted for the outer class.

use tree_sitter::Node;

use crate::safety::is_thread_safe;
use crate::syntax::SourceUnit;
use crate::types::resolve_display_type;

/// Storage kind of a declaration. Exactly one per declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Field,
    StaticField,
    Property,
    LocalVariable,
}

/// A named variable-like entity found in a class. Immutable once built.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub declared_type: String,
    pub line: usize,
    pub is_thread_safe: bool,
    /// Enclosing method name; `None` for declarations outside method
    /// bodies (fields, properties, constructor/accessor locals).
    pub owning_method: Option<String>,
}

/// A class declaration and the declarations found inside it.
#[derive(Debug, Clone)]
pub struct ClassScope {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// Collect every class in the file, in source order, with its declarations.
pub fn collect_classes(unit: &SourceUnit) -> Vec<ClassScope> {
    let mut classes = Vec::new();
    collect_classes_in(unit, unit.root(), &mut classes);
    classes
}

fn collect_classes_in(unit: &SourceUnit, node: Node<'_>, out: &mut Vec<ClassScope>) {
    if node.kind() == "class_declaration" {
        let name = node
            .child_by_field_name("name")
            .map(|n| unit.text(n).to_string())
            .unwrap_or_default();
        out.push(ClassScope {
            name,
            declarations: collect_class(unit, node),
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_classes_in(unit, child, out);
    }
}

fn collect_class(unit: &SourceUnit, class: Node<'_>) -> Vec<Declaration> {
    let Some(body) = class.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut declarations = Vec::new();

    // Fields, one declaration per co-declared name.
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "field_declaration" {
            continue;
        }
        let modifiers = modifier_texts(unit, member);
        let kind = if modifiers.iter().any(|m| m == "static") {
            DeclKind::StaticField
        } else {
            DeclKind::Field
        };
        collect_from_variable_declaration(unit, member, kind, &modifiers, None, &mut declarations);
    }

    // Properties.
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "property_declaration" {
            continue;
        }
        let (Some(type_node), Some(name_node)) = (
            member.child_by_field_name("type"),
            member.child_by_field_name("name"),
        ) else {
            continue;
        };
        let attributes = attribute_names(unit, member);
        declarations.push(Declaration {
            name: unit.text(name_node).to_string(),
            kind: DeclKind::Property,
            declared_type: resolve_display_type(unit, type_node, None),
            line: unit.line(member),
            is_thread_safe: is_thread_safe(DeclKind::Property, &[], &attributes),
            owning_method: None,
        });
    }

    // Locals and method-scoped variables, anywhere in the class body.
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        collect_locals(unit, child, None, &mut declarations);
    }

    declarations
}

/// Recursive scan for variable declarations below `node`, carrying the
/// nearest enclosing method name. Stops at nested type boundaries; fields
/// were already collected above.
fn collect_locals(
    unit: &SourceUnit,
    node: Node<'_>,
    enclosing_method: Option<&str>,
    out: &mut Vec<Declaration>,
) {
    match node.kind() {
        "class_declaration"
        | "struct_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "record_declaration" => return,
        "field_declaration" | "event_field_declaration" => {
            // The member's own declaration was collected in the fields
            // pass; only its initializers can hold further declarations
            // (lambda bodies).
            let mut cursor = node.walk();
            for var_decl in node
                .children(&mut cursor)
                .filter(|c| c.kind() == "variable_declaration")
            {
                let mut decls = var_decl.walk();
                for declarator in var_decl
                    .children(&mut decls)
                    .filter(|c| c.kind() == "variable_declarator")
                {
                    let mut inner = declarator.walk();
                    for child in declarator.children(&mut inner) {
                        collect_locals(unit, child, enclosing_method, out);
                    }
                }
            }
            return;
        }
        "method_declaration" | "local_function_statement" => {
            let name = node.child_by_field_name("name").map(|n| unit.text(n));
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_locals(unit, child, name.or(enclosing_method), out);
            }
            return;
        }
        "variable_declaration" => {
            collect_from_variable_declaration(
                unit,
                node,
                DeclKind::LocalVariable,
                &[],
                enclosing_method,
                out,
            );
            // Initializers may contain nested declarations (lambdas).
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_locals(unit, child, enclosing_method, out);
    }
}

/// Emit one declaration per declarator of the `variable_declaration` under
/// `node` (`node` may be the declaration itself or a statement containing
/// one). All declarators share the statement's line and resolved type.
fn collect_from_variable_declaration(
    unit: &SourceUnit,
    node: Node<'_>,
    kind: DeclKind,
    modifiers: &[String],
    owning_method: Option<&str>,
    out: &mut Vec<Declaration>,
) {
    let var_decl = if node.kind() == "variable_declaration" {
        node
    } else {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|c| c.kind() == "variable_declaration");
        match found {
            Some(found) => found,
            None => return,
        }
    };
    let Some(type_node) = var_decl.child_by_field_name("type") else {
        return;
    };

    let mut cursor = var_decl.walk();
    let declarators: Vec<Node<'_>> = var_decl
        .children(&mut cursor)
        .filter(|c| c.kind() == "variable_declarator")
        .collect();

    let declared_type = resolve_display_type(unit, type_node, declarators.first().copied());
    let line = unit.line(node);

    for declarator in declarators {
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        out.push(Declaration {
            name: unit.text(name_node).to_string(),
            kind,
            declared_type: declared_type.clone(),
            line,
            is_thread_safe: is_thread_safe(kind, modifiers, &[]),
            owning_method: owning_method.map(str::to_string),
        });
    }
}

/// Texts of the `modifier` children of a declaration node.
fn modifier_texts(unit: &SourceUnit, node: Node<'_>) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "modifier")
        .map(|c| unit.text(c).to_string())
        .collect()
}

/// Attribute names attached to a declaration node, one entry per attribute.
fn attribute_names(unit: &SourceUnit, node: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "attribute_list" {
            continue;
        }
        let mut inner = child.walk();
        for attribute in child.named_children(&mut inner) {
            if attribute.kind() == "attribute" {
                let name = attribute
                    .child_by_field_name("name")
                    .map(|n| unit.text(n).to_string())
                    .unwrap_or_else(|| unit.text(attribute).to_string());
                names.push(name);
            }
        }
    }
    names
}
