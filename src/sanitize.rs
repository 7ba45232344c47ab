//! Cleaning generated text into a docstring payload.
//!
//! Backends tend to wrap their answer in a Markdown fence, echo the
//! signature they were shown, or quote the docstring themselves. Each pass
//! peels one layer of each; passes repeat until nothing changes, so the
//! result is a fixed point and sanitizing it again is a no-op.

const FENCE: &str = "```";
const FENCE_TAGS: [&str; 4] = ["", "python", "py", "python3"];
const TRIPLE_QUOTES: [&str; 2] = ["\"\"\"", "'''"];

/// Normalizes raw generated text into the payload placed inside a docstring.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_once(text: &str) -> String {
    let text = strip_fence(text.trim());
    let text = drop_echoed_header(text);
    let text = strip_triple_quotes(text.trim());
    text.trim().to_string()
}

/// Removes a leading Python-tagged fence line and a trailing closing fence.
fn strip_fence(text: &str) -> &str {
    let mut text = text;
    if let Some(after) = text.strip_prefix(FENCE) {
        let (tag, rest) = after.split_once('\n').unwrap_or((after, ""));
        if FENCE_TAGS.contains(&tag.trim().to_ascii_lowercase().as_str()) {
            text = rest.trim();
        }
    }
    if let Some(before) = text.strip_suffix(FENCE) {
        text = before.trim();
    }
    text
}

/// Drops a signature echoed back from the snippet.
///
/// The signature may span several lines and carry a trailing comment. An
/// indented body following it is dropped as well, but only when unindented
/// prose comes after it; otherwise the indented text is the answer itself.
fn drop_echoed_header(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(first) = lines.first() else {
        return text.to_string();
    };
    if !starts_signature(first) {
        return text.to_string();
    }
    let header_len = signature_len(&lines).unwrap_or(1);
    let rest = &lines[header_len..];
    let echoed = rest
        .iter()
        .take_while(|line| line.trim().is_empty() || line.starts_with([' ', '\t']))
        .count();
    let after = &rest[echoed..];
    if after.iter().any(|line| !line.trim().is_empty()) {
        after.join("\n")
    } else {
        rest.join("\n")
    }
}

/// `def name(`, `async def name(`, `class Name(` or `class Name:`.
fn starts_signature(line: &str) -> bool {
    let line = line.trim_start();
    let (rest, openers): (&str, &[char]) = if let Some(rest) = line.strip_prefix("async def ") {
        (rest, &['('][..])
    } else if let Some(rest) = line.strip_prefix("def ") {
        (rest, &['('][..])
    } else if let Some(rest) = line.strip_prefix("class ") {
        (rest, &['(', ':'][..])
    } else {
        return false;
    };
    let rest = rest.trim_start();
    let name_len = rest.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(rest.len());
    name_len > 0
        && !rest.starts_with(|c: char| c.is_ascii_digit())
        && rest[name_len..].trim_start().starts_with(openers)
}

/// Number of lines up to and including the one holding the signature's
/// closing `:` at bracket depth zero.
fn signature_len(lines: &[&str]) -> Option<usize> {
    let mut depth = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in line.chars() {
            if let Some(open) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == open {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => quote = Some(c),
                '#' => break,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                ':' if depth == 0 => return Some(index + 1),
                _ => {}
            }
        }
    }
    None
}

fn strip_triple_quotes(text: &str) -> &str {
    for quotes in TRIPLE_QUOTES {
        if text.len() >= 2 * quotes.len() && text.starts_with(quotes) && text.ends_with(quotes) {
            return &text[quotes.len()..text.len() - quotes.len()];
        }
    }
    text
}
