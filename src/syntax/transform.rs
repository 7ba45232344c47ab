//! Inserting docstrings into a fresh parse of the source.
//!
//! The tree is never edited. Instead every insertion is planned against the
//! immutable tree, keyed by the byte offset it goes in front of, and the new
//! text is produced by copying the source with the planned insertions
//! spliced in. Only whole statements are added, so everything that was in
//! the source comes out unchanged and in order.

use std::collections::{BTreeMap, HashMap};

use tree_sitter::Node;

use super::{first_statement, Definition, DefinitionKind, SourceTree, SyntaxError};

/// Sanitized docstring payloads keyed by `(name, kind)`.
///
/// Definitions are matched by key alone: two functions named `helper` in
/// different classes share one entry and both receive its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocAssignment {
    payloads: HashMap<(String, DefinitionKind), String>,
}

impl DocAssignment {
    /// Creates an empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `payload` to every definition named `name` of `kind`.
    ///
    /// Returns the payload previously assigned to the same key, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        kind: DefinitionKind,
        payload: impl Into<String>,
    ) -> Option<String> {
        self.payloads.insert((name.into(), kind), payload.into())
    }

    /// The payload assigned to `(name, kind)`.
    #[must_use]
    pub fn get(&self, name: &str, kind: DefinitionKind) -> Option<&str> {
        self.payloads.get(&(name.to_string(), kind)).map(String::as_str)
    }

    /// Number of assigned keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Whether nothing has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// A docstring statement waiting to be spliced in front of `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Byte offset in the original source the text goes in front of.
    pub offset: usize,
    /// The full text to insert, indentation and line ending included.
    pub text: String,
    /// Name of the definition receiving the docstring.
    pub name: String,
    /// Kind of the definition receiving the docstring.
    pub kind: DefinitionKind,
}

/// Parses `source` and inserts every assigned docstring that is missing.
///
/// # Errors
///
/// Returns the parser's [`SyntaxError`] when `source` is not valid Python.
pub fn insert_docstrings(source: &str, assignment: &DocAssignment) -> Result<String, SyntaxError> {
    let tree = SourceTree::parse(source)?;
    let plan = plan_insertions(&tree, assignment);
    Ok(apply_insertions(tree.render(), &plan))
}

/// Plans one insertion per undocumented definition whose key is assigned.
///
/// Definitions that already open with a documentation literal are skipped,
/// whatever an earlier extraction pass concluded about them.
#[must_use]
pub fn plan_insertions(tree: &SourceTree, assignment: &DocAssignment) -> BTreeMap<usize, Insertion> {
    let mut plan = BTreeMap::new();
    if assignment.is_empty() {
        return plan;
    }
    for definition in tree.definitions() {
        if definition.has_doc {
            continue;
        }
        let Some(payload) = assignment.get(definition.name, definition.kind) else {
            continue;
        };
        match plan_one(&definition, tree.render(), payload) {
            Some(insertion) => {
                plan.insert(insertion.offset, insertion);
            }
            None => tracing::debug!(
                name = definition.name,
                kind = %definition.kind,
                "no insertion point found, leaving definition as is"
            ),
        }
    }
    plan
}

/// Copies `source` with every planned insertion spliced in at its offset.
#[must_use]
pub fn apply_insertions(source: &str, plan: &BTreeMap<usize, Insertion>) -> String {
    let extra: usize = plan.values().map(|insertion| insertion.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut copied = 0;
    for (&offset, insertion) in plan {
        out.push_str(&source[copied..offset]);
        out.push_str(&insertion.text);
        copied = offset;
    }
    out.push_str(&source[copied..]);
    out
}

fn plan_one(definition: &Definition<'_>, source: &str, payload: &str) -> Option<Insertion> {
    let block = definition.body()?;
    let statement = first_statement(block)?;
    let colon = header_colon(definition.node, block)?;

    let (offset, text) = if statement.start_position().row == colon.end_position().row {
        // Body shares the header line: `def f(): pass`.
        (statement.start_byte(), format!("{}; ", doc_literal(payload, None, "\n")))
    } else {
        let line_end = colon.end_byte() + source[colon.end_byte()..].find('\n')?;
        let offset = line_end + 1;
        let newline = if source[..line_end].ends_with('\r') { "\r\n" } else { "\n" };
        let indent = statement_indent(statement, source);
        let literal = doc_literal(payload, Some(&indent), newline);
        (offset, format!("{indent}{literal}{newline}"))
    };

    Some(Insertion {
        offset,
        text,
        name: definition.name.to_string(),
        kind: definition.kind,
    })
}

/// The `:` ending the definition header, just before the body.
fn header_colon<'tree>(definition: Node<'tree>, block: Node<'tree>) -> Option<Node<'tree>> {
    let mut cursor = definition.walk();
    // Bound so the iterator borrowing `cursor` is dropped first.
    let colon = definition
        .children(&mut cursor)
        .filter(|child| child.kind() == ":" && child.end_byte() <= block.start_byte())
        .last();
    colon
}

fn statement_indent(statement: Node<'_>, source: &str) -> String {
    let line_start = source[..statement.start_byte()].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..statement.start_byte()];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        " ".repeat(statement.start_position().column)
    }
}

/// Renders `payload` as a triple-double-quoted literal.
///
/// With an `indent`, continuation lines are indented to match the body and
/// multi-line docstrings close on their own line.
fn doc_literal(payload: &str, indent: Option<&str>, newline: &str) -> String {
    let escaped = escape_payload(payload);
    let mut lines = escaped.lines();
    let mut body = lines.next().unwrap_or_default().to_string();
    let mut multiline = false;
    for line in lines {
        multiline = true;
        body.push_str(newline);
        if let Some(indent) = indent.filter(|_| !line.trim().is_empty()) {
            body.push_str(indent);
        }
        body.push_str(line);
    }
    match indent {
        Some(indent) if multiline => format!("\"\"\"{body}{newline}{indent}\"\"\""),
        _ => format!("\"\"\"{body}\"\"\""),
    }
}

/// Escapes the payload so the literal decodes back to exactly `payload`.
///
/// Backslashes are doubled first, so `\u`, `\x` or a trailing `\` cannot
/// form an escape sequence; then quotes that would close the literal early
/// are escaped.
fn escape_payload(payload: &str) -> String {
    let doubled = payload.replace('\\', "\\\\");
    let body = doubled.trim_end_matches('"');
    let trailing_quotes = doubled.len() - body.len();

    let mut escaped = body.replace("\"\"\"", "\\\"\\\"\\\"");
    escaped.push_str(&"\\\"".repeat(trailing_quotes));
    escaped
}
