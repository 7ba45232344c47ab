//! Finding the definitions that still need a docstring.

use serde::Serialize;

use std::ops::Range;

use super::{string_ranges, DefinitionKind, SourceTree, SyntaxError};

/// An undocumented definition, detached from the tree it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDefinition {
    /// Identifier of the function or class.
    pub name: String,
    /// Function or class.
    pub kind: DefinitionKind,
    /// The definition's own source, decorators included, re-based to column
    /// zero and newline-terminated.
    pub snippet: String,
}

/// Parses `source` and lists its undocumented definitions in pre-order.
///
/// # Errors
///
/// Returns the parser's [`SyntaxError`] when `source` is not valid Python.
pub fn extract_definitions(source: &str) -> Result<Vec<ExtractedDefinition>, SyntaxError> {
    let tree = SourceTree::parse(source)?;
    Ok(tree
        .definitions()
        .into_iter()
        .filter(|definition| !definition.has_doc)
        .map(|definition| {
            let outer = definition.outer_node();
            ExtractedDefinition {
                name: definition.name.to_string(),
                kind: definition.kind,
                snippet: rebase(
                    tree.text(outer),
                    outer.start_position().column,
                    &string_ranges(outer),
                ),
            }
        })
        .collect())
}

/// Strips up to `column` leading whitespace characters from every line after
/// the first, which already starts at the node.
///
/// Lines that begin inside one of the `strings` ranges are copied verbatim.
fn rebase(text: &str, column: usize, strings: &[Range<usize>]) -> String {
    let mut snippet = String::with_capacity(text.len() + 1);
    let mut line_start = 0;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        let start = line_start;
        line_start += line.len();
        let in_string = strings.iter().any(|range| range.start < start && start < range.end);
        if index == 0 || column == 0 || in_string {
            snippet.push_str(line);
            continue;
        }
        let strip: usize = line
            .char_indices()
            .take(column)
            .take_while(|(_, c)| *c == ' ' || *c == '\t')
            .map(|(_, c)| c.len_utf8())
            .sum();
        snippet.push_str(&line[strip..]);
    }
    if !snippet.ends_with('\n') {
        snippet.push('\n');
    }
    snippet
}
