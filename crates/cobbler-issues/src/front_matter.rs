//! Issue body front-matter: a delimited `---`-fenced header of `key: value`
//! lines followed by the YAML task description (spec.md sec 4.3, 6.3).

/// Front-matter fields on an issue body. `depends_on = -1` means "no
/// dependency" (spec.md sec 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFrontMatter {
    pub generation: String,
    pub index: i64,
    pub depends_on: i64,
}

impl IssueFrontMatter {
    #[must_use]
    pub fn new(generation: impl Into<String>, index: i64, depends_on: i64) -> Self {
        Self {
            generation: generation.into(),
            index,
            depends_on,
        }
    }

    #[must_use]
    pub fn is_blocked_by(&self, open_indices: &std::collections::HashSet<i64>) -> bool {
        self.depends_on >= 0 && open_indices.contains(&self.depends_on)
    }
}

impl Default for IssueFrontMatter {
    fn default() -> Self {
        Self {
            generation: String::new(),
            index: 0,
            depends_on: -1,
        }
    }
}

/// Render `front_matter` as the `---`-delimited header, followed by `body`.
#[must_use]
pub fn format_issue_body(front_matter: &IssueFrontMatter, body: &str) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("generation: {}\n", front_matter.generation));
    out.push_str(&format!("index: {}\n", front_matter.index));
    if front_matter.depends_on >= 0 {
        out.push_str(&format!("depends_on: {}\n", front_matter.depends_on));
    }
    out.push_str("---\n");
    out.push_str(body);
    out
}

/// Parse the front-matter block from an issue body. Missing front-matter
/// yields the zero-value (`depends_on = -1`); unknown keys are ignored
/// (spec.md sec 4.3, 6.3).
#[must_use]
pub fn parse_issue_front_matter(full_body: &str) -> (IssueFrontMatter, String) {
    let mut lines = full_body.lines();
    let Some(first) = lines.next() else {
        return (IssueFrontMatter::default(), full_body.to_string());
    };
    if first.trim() != "---" {
        return (IssueFrontMatter::default(), full_body.to_string());
    }

    let mut fm = IssueFrontMatter::default();
    let mut consumed = first.len() + 1;
    let mut closed = false;

    for line in lines.by_ref() {
        consumed += line.len() + 1;
        if line.trim() == "---" {
            closed = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "generation" => fm.generation = value.to_string(),
            "index" => fm.index = value.parse().unwrap_or(0),
            "depends_on" => fm.depends_on = value.parse().unwrap_or(-1),
            _ => {} // unknown keys ignored
        }
    }

    if !closed {
        return (IssueFrontMatter::default(), full_body.to_string());
    }

    let rest = full_body.get(consumed.min(full_body.len())..).unwrap_or("");
    (fm, rest.trim_start_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_with_dependency() {
        let fm = IssueFrontMatter::new("gen-1", 3, 1);
        let body = format_issue_body(&fm, "description: text\n");
        let (parsed, rest) = parse_issue_front_matter(&body);
        assert_eq!(parsed, fm);
        assert_eq!(rest, "description: text\n");
    }

    #[test]
    fn round_trips_without_dependency() {
        let fm = IssueFrontMatter::new("gen-1", 1, -1);
        let body = format_issue_body(&fm, "x: 1\n");
        let (parsed, _rest) = parse_issue_front_matter(&body);
        assert_eq!(parsed, fm);
    }

    #[test]
    fn missing_front_matter_yields_zero_value() {
        let (fm, rest) = parse_issue_front_matter("just a plain body\n");
        assert_eq!(fm, IssueFrontMatter::default());
        assert_eq!(rest, "just a plain body\n");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let body = "---\ngeneration: g\nindex: 1\nfuture_field: surprise\n---\nbody text\n";
        let (fm, rest) = parse_issue_front_matter(body);
        assert_eq!(fm.generation, "g");
        assert_eq!(fm.index, 1);
        assert_eq!(rest, "body text\n");
    }

    proptest! {
        #[test]
        fn front_matter_round_trip(
            generation in "[a-zA-Z0-9_-]{1,20}",
            index in 0i64..10_000,
            depends_on in -1i64..10_000,
        ) {
            let fm = IssueFrontMatter::new(generation, index, depends_on);
            let body = format_issue_body(&fm, "payload\n");
            let (parsed, _rest) = parse_issue_front_matter(&body);
            prop_assert_eq!(parsed, fm);
        }
    }
}
