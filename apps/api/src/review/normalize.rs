//! Whitespace canonicalization for resume text before it is embedded in a prompt.

use std::sync::OnceLock;

use regex::Regex;

fn paragraph_break() -> &'static Regex {
    static PARAGRAPH_BREAK: OnceLock<Regex> = OnceLock::new();
    PARAGRAPH_BREAK.get_or_init(|| Regex::new(r"\n\s*\n").expect("static regex"))
}

/// Collapses whitespace while keeping paragraph structure.
///
/// Any run of blank lines becomes exactly one blank line; inside a paragraph
/// every whitespace run (single newlines included) becomes one space. The
/// result is trimmed and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    paragraph_break()
        .split(&text)
        .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
