//! Line-numbering for source files embedded in a `ProjectContext` (spec §4.4
//! "Source-code gathering"; invariant I8).

/// Reformat `text` so every non-blank line is prefixed with its 1-based line
/// number followed by `" | "`. Blank lines are omitted from the output, but
/// line numbers still reflect the gap they leave behind — the numbering
/// tracks the original file, not the filtered output.
#[must_use]
pub fn number_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let lineno = idx + 1;
        out.push_str(&lineno.to_string());
        out.push_str(" | ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
