use std::collections::HashMap;

use crate::section::{Section, SectionFormat, Template, substitute};

/// Render `template` against `placeholders` (substituted into section
/// `text` only, never into appended values) and `data` (the source of
/// `append` values). Sections whose `append` key resolves to an empty
/// string are omitted entirely (spec.md sec 4.5).
#[must_use]
pub fn render(template: &Template, placeholders: &HashMap<String, String>, data: &HashMap<String, String>) -> String {
    let mut out = String::new();

    for (name, section) in template {
        let rendered = match section {
            Section::Scalar(text) => Some((heading_for(name, None), substitute(text, placeholders))),
            Section::Structured {
                text,
                append,
                format,
                heading,
            } => render_structured(text, append.as_deref(), *format, heading.as_deref(), name, placeholders, data),
        };

        if let Some((heading, body)) = rendered {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&heading);
            out.push('\n');
            out.push_str(&body);
            if !body.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    out
}

fn render_structured(
    text: &str,
    append: Option<&str>,
    format: SectionFormat,
    heading_override: Option<&str>,
    name: &str,
    placeholders: &HashMap<String, String>,
    data: &HashMap<String, String>,
) -> Option<(String, String)> {
    let substituted = substitute(text, placeholders);
    let heading = heading_for(name, heading_override);

    let Some(key) = append else {
        return Some((heading, substituted));
    };

    let value = data.get(key).map(String::as_str).unwrap_or("");
    if value.is_empty() {
        return None;
    }

    let mut body = substituted;
    match format {
        SectionFormat::Yaml => {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str("```yaml\n");
            body.push_str(value);
            if !value.ends_with('\n') {
                body.push('\n');
            }
            body.push_str("```");
        }
        SectionFormat::Raw => {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(value);
        }
    }
    Some((heading, body))
}

fn heading_for(name: &str, override_heading: Option<&str>) -> String {
    match override_heading {
        Some(h) => h.to_string(),
        None => format!("# {}", name.to_uppercase()),
    }
}
