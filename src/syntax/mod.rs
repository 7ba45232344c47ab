//! Lossless Python source trees.
//!
//! A [`SourceTree`] owns the exact text of one file together with the
//! tree-sitter tree parsed from it. Nodes only carry byte ranges into that
//! text, so rendering an untouched tree is the text itself and every edit is
//! expressed as an insertion at a byte offset.

pub mod extract;
pub mod transform;

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

/// The two kinds of definition that can carry a docstring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// A `def` or `async def` statement.
    Function,
    /// A `class` statement.
    Class,
}

impl DefinitionKind {
    /// Maps a tree-sitter node kind to a definition kind.
    #[must_use]
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "function_definition" => Some(Self::Function),
            "class_definition" => Some(Self::Class),
            _ => None,
        }
    }

    /// The lowercase name used in prompts and progress output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while turning source text into a [`SourceTree`].
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The bundled Python grammar could not be loaded into the parser.
    #[error("failed to load the Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    /// The parser gave up without producing a tree.
    #[error("parser produced no tree")]
    NoTree,
    /// The text is not valid Python.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Invalid {
        /// 1-based line of the first problem.
        line: usize,
        /// 1-based column of the first problem.
        column: usize,
        /// What the parser found there.
        message: String,
    },
}

/// One file's text and its concrete syntax tree.
pub struct SourceTree {
    source: String,
    tree: Tree,
}

impl SourceTree {
    /// Parses `source` as Python.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Invalid`] pointing at the first error or missing
    /// node when the text does not parse cleanly.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        let tree = parser.parse(source, None).ok_or(SyntaxError::NoTree)?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(describe_error(root, source));
        }

        Ok(Self { source: source.to_string(), tree })
    }

    /// Re-serializes the tree. Untouched trees render to their input exactly.
    #[must_use]
    pub fn render(&self) -> &str {
        &self.source
    }

    /// Every function and class definition, in depth-first pre-order.
    ///
    /// Nested definitions follow their enclosing definition and precede the
    /// enclosing definition's later siblings.
    #[must_use]
    pub fn definitions(&self) -> Vec<Definition<'_>> {
        let mut found = Vec::new();
        let mut cursor = self.tree.walk();
        loop {
            let node = cursor.node();
            if let Some(kind) = DefinitionKind::from_node_kind(node.kind()) {
                if let Some(definition) = Definition::new(node, kind, &self.source) {
                    found.push(definition);
                }
            }
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return found;
                }
            }
        }
    }

    pub(crate) fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }
}

/// A function or class definition located in a [`SourceTree`].
#[derive(Debug, Clone, Copy)]
pub struct Definition<'tree> {
    /// The identifier after `def` or `class`.
    pub name: &'tree str,
    /// Function or class.
    pub kind: DefinitionKind,
    /// The `function_definition` or `class_definition` node.
    pub node: Node<'tree>,
    /// Whether the body already opens with a documentation literal.
    pub has_doc: bool,
}

impl<'tree> Definition<'tree> {
    fn new(node: Node<'tree>, kind: DefinitionKind, source: &'tree str) -> Option<Self> {
        let name = &source[node.child_by_field_name("name")?.byte_range()];
        let has_doc = body(node)
            .and_then(first_statement)
            .is_some_and(|statement| is_doc_literal(statement, source));
        Some(Self { name, kind, node, has_doc })
    }

    /// The `block` holding the definition's statements.
    #[must_use]
    pub fn body(&self) -> Option<Node<'tree>> {
        body(self.node)
    }

    /// The node whose text reproduces the whole definition, decorators included.
    #[must_use]
    pub fn outer_node(&self) -> Node<'tree> {
        match self.node.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent,
            _ => self.node,
        }
    }
}

fn body(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("body")
}

/// First statement of a block, skipping comments.
pub(crate) fn first_statement(block: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = block.walk();
    let statement = block.named_children(&mut cursor).find(|child| child.kind() != "comment");
    statement
}

/// Whether `statement` is an expression statement made of a single text
/// literal: a plain or implicitly concatenated string, possibly parenthesized,
/// with no `f` or `b` prefix.
fn is_doc_literal(statement: Node<'_>, source: &str) -> bool {
    if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
        return false;
    }
    let mut expression = statement.named_child(0);
    while let Some(inner) = expression.filter(|e| e.kind() == "parenthesized_expression") {
        expression = inner.named_child(0).filter(|_| inner.named_child_count() == 1);
    }
    let Some(expression) = expression else {
        return false;
    };
    match expression.kind() {
        "string" => is_text_string(expression, source),
        "concatenated_string" => {
            let mut cursor = expression.walk();
            let plain = expression
                .named_children(&mut cursor)
                .all(|part| part.kind() == "string" && is_text_string(part, source));
            plain
        }
        _ => false,
    }
}

/// A string literal whose prefix makes it neither formatted nor bytes.
fn is_text_string(string: Node<'_>, source: &str) -> bool {
    !string
        .child(0)
        .filter(|start| start.kind() == "string_start")
        .is_some_and(|start| source[start.byte_range()].contains(['f', 'F', 'b', 'B']))
}

/// Byte ranges of the string literals inside `node`, relative to its start.
pub(crate) fn string_ranges(node: Node<'_>) -> Vec<Range<usize>> {
    let offset = node.start_byte();
    let mut ranges = Vec::new();
    let mut cursor = node.walk();
    loop {
        let current = cursor.node();
        if current.kind() == "string" {
            ranges.push(current.start_byte() - offset..current.end_byte() - offset);
        } else if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.node() == node {
                return ranges;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return ranges;
            }
        }
    }
}

fn describe_error(root: Node<'_>, source: &str) -> SyntaxError {
    let mut cursor = root.walk();
    let mut culprit = None;
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            culprit = Some(node);
            break;
        }
        let descend = node.has_error() && cursor.goto_first_child();
        if descend {
            continue;
        }
        let mut advanced = false;
        loop {
            if cursor.goto_next_sibling() {
                advanced = true;
                break;
            }
            if !cursor.goto_parent() {
                break;
            }
        }
        if !advanced {
            break;
        }
    }

    let node = culprit.unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = source[node.byte_range()]
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .chars()
            .take(40)
            .collect();
        if snippet.is_empty() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected `{snippet}`")
        }
    };

    SyntaxError::Invalid { line: position.row + 1, column: position.column + 1, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_reproduces_input_exactly() {
        let source = "# header\n\n\ndef f(a,  b):   # trailing\n\treturn a\t+ b\n\n\n";
        let tree = SourceTree::parse(source).unwrap();
        assert_eq!(tree.render(), source);
    }

    #[test]
    fn definitions_are_listed_in_preorder() {
        let source = "\
class Outer:
    def method(self):
        def inner():
            pass
        return inner

def after():
    pass
";
        let tree = SourceTree::parse(source).unwrap();
        let names: Vec<_> = tree.definitions().iter().map(|d| (d.name, d.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("Outer", DefinitionKind::Class),
                ("method", DefinitionKind::Function),
                ("inner", DefinitionKind::Function),
                ("after", DefinitionKind::Function),
            ]
        );
    }

    #[test]
    fn detects_existing_docstrings() {
        let source = "\
def plain():
    pass

def documented():
    \"\"\"Already here.\"\"\"

def commented():
    # leading comment
    'single quoted doc'

def formatted():
    f\"not {plain} a docstring\"

def joined():
    \"part one \" \"part two\"

def inline(): \"inline doc\"

def raw_bytes():
    b\"bytes are not docs\"

def upper_bytes():
    RB'raw bytes either'

def wrapped():
    (\"parenthesized doc\")

def wrapped_joined():
    ((\"first \"
      \"second\"))

def wrapped_tuple():
    (\"a\", \"b\")

def raw_text():
    r\"raw text is a doc\"
";
        let tree = SourceTree::parse(source).unwrap();
        let docs: Vec<_> = tree.definitions().iter().map(|d| (d.name, d.has_doc)).collect();
        assert_eq!(
            docs,
            vec![
                ("plain", false),
                ("documented", true),
                ("commented", true),
                ("formatted", false),
                ("joined", true),
                ("inline", true),
                ("raw_bytes", false),
                ("upper_bytes", false),
                ("wrapped", true),
                ("wrapped_joined", true),
                ("wrapped_tuple", false),
                ("raw_text", true),
            ]
        );
    }

    #[test]
    fn async_and_decorated_functions_are_definitions() {
        let source = "@cache\nasync def fetch():\n    return 1\n";
        let tree = SourceTree::parse(source).unwrap();
        let definitions = tree.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "fetch");
        assert_eq!(definitions[0].outer_node().kind(), "decorated_definition");
    }

    #[test]
    fn parse_error_reports_position() {
        let err = SourceTree::parse("def ok():\n    pass\n\ndef broken(:\n    pass\n")
            .err()
            .expect("broken source must not parse");
        match err {
            SyntaxError::Invalid { line, .. } => assert_eq!(line, 4),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(DefinitionKind::Function.to_string(), "function");
        assert_eq!(DefinitionKind::Class.to_string(), "class");
    }
}
