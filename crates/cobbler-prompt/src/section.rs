use std::collections::HashMap;

/// How an appended value is wrapped into the rendered section (spec.md sec
/// 4.5: `format` key of a structured section).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionFormat {
    /// Fence the appended value in a ```yaml block, ensuring a trailing
    /// newline before the closing fence.
    Yaml,
    /// Append the raw value, preceded by a newline.
    Raw,
}

/// One named section of a prompt template.
#[derive(Debug, Clone)]
pub enum Section {
    /// Plain text, placeholder-substituted, always rendered.
    Scalar(String),
    /// `{text, append, format, heading}` (spec.md sec 4.5).
    Structured {
        text: String,
        append: Option<String>,
        format: SectionFormat,
        heading: Option<String>,
    },
}

impl Section {
    #[must_use]
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    #[must_use]
    pub fn structured(text: impl Into<String>, append: impl Into<String>, format: SectionFormat) -> Self {
        Self::Structured {
            text: text.into(),
            append: Some(append.into()),
            format,
            heading: None,
        }
    }

}

/// A named, ordered prompt template: `(section name, section)` pairs.
pub type Template = Vec<(String, Section)>;

/// Substitute `{placeholder}` tokens in `text` from `placeholders`. Tokens
/// with no matching key are left untouched.
#[must_use]
pub fn substitute(text: &str, placeholders: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after_brace = &rest[start + 1..];
        match after_brace.find('}') {
            Some(end) => {
                let key = &after_brace[..end];
                match placeholders.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after_brace[end + 1..];
            }
            None => {
                out.push('{');
                rest = after_brace;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), "cobbler".to_string());
        assert_eq!(substitute("hello {name}!", &map), "hello cobbler!");
    }

    #[test]
    fn leaves_unknown_placeholders_untouched() {
        let map = HashMap::new();
        assert_eq!(substitute("hello {name}!", &map), "hello {name}!");
    }

    #[test]
    fn handles_unbalanced_braces_without_panicking() {
        let map = HashMap::new();
        assert_eq!(substitute("a { b", &map), "a { b");
    }
}
