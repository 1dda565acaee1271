//! Parsing boundary around tree-sitter
//!
//! A [`SourceUnit`] owns one file's normalized source text together with its
//! parsed tree, and exposes the node accessors the rest of the crate needs
//! (text, 1-based line numbers, preorder traversal).
//!
//! Conditional compilation regions are resolved *before* parsing: inactive
//! `#if`/`#elif`/`#else` regions are blanked line-by-line so the tree only
//! contains active code while every node keeps its original line number.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node, Parser, Tree};

/// Options applied when parsing a file.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Symbols considered defined when evaluating `#if` directives.
    pub preprocessor_symbols: Vec<String>,
}

/// Errors from the parsing boundary.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to load C# grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("parser produced no syntax tree")]
    Unparsed,
}

/// One parsed source file. Discarded after its rows are emitted.
pub struct SourceUnit {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl SourceUnit {
    /// Parse `source` as C#. Line endings are normalized to `\n` and
    /// inactive preprocessor regions are blanked before parsing.
    pub fn parse(
        path: impl Into<PathBuf>,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let normalized = source.replace("\r\n", "\n");
        let active = strip_inactive_regions(&normalized, &options.preprocessor_symbols);

        let mut parser = Parser::new();
        let language: Language = tree_sitter_c_sharp::LANGUAGE.into();
        parser.set_language(&language)?;
        let tree = parser.parse(active.as_bytes(), None).ok_or(ParseError::Unparsed)?;

        Ok(Self {
            path: path.into(),
            source: active,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// 1-based line of the node's first character.
    pub fn line(&self, node: Node<'_>) -> usize {
        node.start_position().row + 1
    }
}

/// Visit `node` and all descendants in preorder (file appearance order).
pub fn preorder<'a>(node: Node<'a>, visit: &mut dyn FnMut(Node<'a>)) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        preorder(child, visit);
    }
}

/// Blank out lines that fall in inactive `#if`/`#elif`/`#else` regions.
///
/// The result has exactly as many lines as the input; directive lines are
/// blanked as well. `#define`/`#undef` adjust the symbol set for the rest of
/// the file. Malformed or unterminated directives leave the remainder of the
/// file active rather than failing it.
pub fn strip_inactive_regions(source: &str, symbols: &[String]) -> String {
    if !source.contains('#') {
        return source.to_string();
    }

    let mut defined: HashSet<&str> = symbols.iter().map(String::as_str).collect();

    // One frame per open #if: whether the enclosing region is active, and
    // whether any branch of this directive chain has been taken yet.
    struct Frame {
        parent_active: bool,
        branch_taken: bool,
        active: bool,
    }

    let mut frames: Vec<Frame> = Vec::new();
    let mut out = String::with_capacity(source.len());

    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let enclosing_active = frames.last().map_or(true, |f| f.active);
        let trimmed = line.trim_start();

        if let Some(rest) = trimmed.strip_prefix("#if") {
            let taken = enclosing_active && eval_condition(rest, &defined);
            frames.push(Frame {
                parent_active: enclosing_active,
                branch_taken: taken,
                active: taken,
            });
        } else if let Some(rest) = trimmed.strip_prefix("#elif") {
            if let Some(frame) = frames.last_mut() {
                frame.active =
                    frame.parent_active && !frame.branch_taken && eval_condition(rest, &defined);
                frame.branch_taken |= frame.active;
            }
        } else if trimmed.starts_with("#else") {
            if let Some(frame) = frames.last_mut() {
                frame.active = frame.parent_active && !frame.branch_taken;
                frame.branch_taken |= frame.active;
            }
        } else if trimmed.starts_with("#endif") {
            frames.pop();
        } else if let Some(rest) = trimmed.strip_prefix("#define") {
            if enclosing_active {
                if let Some(symbol) = first_identifier(rest) {
                    defined.insert(symbol);
                }
            }
        } else if let Some(rest) = trimmed.strip_prefix("#undef") {
            if enclosing_active {
                if let Some(symbol) = first_identifier(rest) {
                    defined.remove(symbol);
                }
            }
        } else {
            if enclosing_active {
                out.push_str(line);
            }
            continue;
        }
        // Directive lines are always blanked.
    }

    out
}

fn first_identifier(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let end = trimmed
        .find(|c: char| !c.is_alphanumeric() && c != '_')
        .unwrap_or(trimmed.len());
    if end == 0 {
        None
    } else {
        Some(&trimmed[..end])
    }
}

/// Evaluate a directive condition: identifiers, `true`/`false`, `!`, `&&`,
/// `||` and parentheses. Anything unparseable evaluates to `true` so that
/// malformed directives keep code visible.
fn eval_condition(raw: &str, defined: &HashSet<&str>) -> bool {
    // Trailing line comments are not part of the condition.
    let expr = match raw.find("//") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let tokens = tokenize(expr);
    let mut parser = CondParser {
        tokens: &tokens,
        pos: 0,
        defined,
    };
    match parser.or_expr() {
        Some(value) if parser.pos == tokens.len() => value,
        _ => true,
    }
}

#[derive(Debug, PartialEq)]
enum Tok<'a> {
    Ident(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Vec<Tok<'_>> {
    let mut tokens = Vec::new();
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'!' => {
                tokens.push(Tok::Not);
                i += 1;
            }
            b'(' => {
                tokens.push(Tok::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Tok::Close);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(Tok::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(Tok::Or);
                i += 2;
            }
            c if c.is_ascii_alphanumeric() || c == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Tok::Ident(&expr[start..i]));
            }
            _ => {
                // Unknown token: poison the stream so the caller falls back
                // to treating the region as active.
                tokens.push(Tok::Ident("\0invalid"));
                i += 1;
            }
        }
    }
    tokens
}

struct CondParser<'a, 'b> {
    tokens: &'b [Tok<'a>],
    pos: usize,
    defined: &'b HashSet<&'a str>,
}

impl CondParser<'_, '_> {
    fn or_expr(&mut self) -> Option<bool> {
        let mut value = self.and_expr()?;
        while matches!(self.tokens.get(self.pos), Some(Tok::Or)) {
            self.pos += 1;
            value |= self.and_expr()?;
        }
        Some(value)
    }

    fn and_expr(&mut self) -> Option<bool> {
        let mut value = self.unary()?;
        while matches!(self.tokens.get(self.pos), Some(Tok::And)) {
            self.pos += 1;
            value &= self.unary()?;
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<bool> {
        match self.tokens.get(self.pos)? {
            Tok::Not => {
                self.pos += 1;
                Some(!self.unary()?)
            }
            Tok::Open => {
                self.pos += 1;
                let value = self.or_expr()?;
                match self.tokens.get(self.pos) {
                    Some(Tok::Close) => {
                        self.pos += 1;
                        Some(value)
                    }
                    _ => None,
                }
            }
            Tok::Ident("true") => {
                self.pos += 1;
                Some(true)
            }
            Tok::Ident("false") => {
                self.pos += 1;
                Some(false)
            }
            Tok::Ident("\0invalid") => None,
            Tok::Ident(name) => {
                let value = self.defined.contains(name);
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_class() {
        let source = "class Foo { private int count; }";
        let unit = SourceUnit::parse("Foo.cs", source, &ParseOptions::default()).unwrap();
        assert_eq!(unit.root().kind(), "compilation_unit");
        assert!(!unit.root().has_error());
    }

    #[test]
    fn test_crlf_normalized() {
        let source = "class Foo\r\n{\r\n}\r\n";
        let unit = SourceUnit::parse("Foo.cs", source, &ParseOptions::default()).unwrap();
        assert!(!unit.source().contains('\r'));
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let source = "class Foo\n{\n    private int count;\n}\n";
        let unit = SourceUnit::parse("Foo.cs", source, &ParseOptions::default()).unwrap();
        let mut field_line = 0;
        preorder(unit.root(), &mut |node| {
            if node.kind() == "field_declaration" {
                field_line = unit.line(node);
            }
        });
        assert_eq!(field_line, 3);
    }

    #[test]
    fn test_strip_without_directives_is_identity() {
        let source = "class Foo\n{\n}\n";
        assert_eq!(strip_inactive_regions(source, &[]), source);
    }

    #[test]
    fn test_strip_inactive_if_region() {
        let source = "a\n#if DEBUG\nb\n#endif\nc";
        let stripped = strip_inactive_regions(source, &[]);
        assert_eq!(stripped, "a\n\n\n\nc");
    }

    #[test]
    fn test_strip_keeps_active_if_region() {
        let source = "a\n#if DEBUG\nb\n#endif\nc";
        let stripped = strip_inactive_regions(source, &symbols(&["DEBUG"]));
        assert_eq!(stripped, "a\n\nb\n\nc");
    }

    #[test]
    fn test_strip_else_branch() {
        let source = "#if DEBUG\na\n#else\nb\n#endif";
        let stripped = strip_inactive_regions(source, &[]);
        assert_eq!(stripped, "\n\n\nb\n");
    }

    #[test]
    fn test_strip_elif_chain() {
        let source = "#if A\na\n#elif B\nb\n#elif C\nc\n#else\nd\n#endif";
        let stripped = strip_inactive_regions(source, &symbols(&["C"]));
        assert_eq!(stripped, "\n\n\n\n\nc\n\n\n");
    }

    #[test]
    fn test_strip_nested_regions() {
        let source = "#if A\n#if B\nx\n#endif\ny\n#endif";
        let inner_only = strip_inactive_regions(source, &symbols(&["A"]));
        assert_eq!(inner_only, "\n\n\n\ny\n");
        let both = strip_inactive_regions(source, &symbols(&["A", "B"]));
        assert_eq!(both, "\n\nx\n\ny\n");
    }

    #[test]
    fn test_strip_preserves_line_count() {
        let source = "a\n#if X\nb\nc\n#endif\nd\n";
        let stripped = strip_inactive_regions(source, &[]);
        assert_eq!(source.split('\n').count(), stripped.split('\n').count());
    }

    #[test]
    fn test_define_and_undef() {
        let source = "#define LOCAL\n#if LOCAL\na\n#endif\n#undef LOCAL\n#if LOCAL\nb\n#endif";
        let stripped = strip_inactive_regions(source, &[]);
        assert!(stripped.contains('a'));
        assert!(!stripped.contains('b'));
    }

    #[test]
    fn test_condition_operators() {
        let defined: HashSet<&str> = ["A", "B"].into_iter().collect();
        assert!(eval_condition(" A && B", &defined));
        assert!(!eval_condition(" A && C", &defined));
        assert!(eval_condition(" A || C", &defined));
        assert!(eval_condition(" !C", &defined));
        assert!(eval_condition(" (A || C) && B", &defined));
        assert!(eval_condition(" true", &HashSet::new()));
        assert!(!eval_condition(" false", &HashSet::new()));
        assert!(eval_condition(" A // comment", &defined));
    }

    #[test]
    fn test_malformed_condition_stays_active() {
        let source = "#if ???\na\n#endif";
        let stripped = strip_inactive_regions(source, &[]);
        assert!(stripped.contains('a'));
    }

    #[test]
    fn test_unterminated_region_keeps_rest_active() {
        // No #endif: the open frame applies to end of file.
        let source = "#if DEBUG\na";
        let stripped = strip_inactive_regions(source, &symbols(&["DEBUG"]));
        assert!(stripped.contains('a'));
    }
}
