use regex::Regex;

/// Pull the first fenced ` ```yaml ` block out of `text` (spec.md sec 4.6).
/// A missing block is the signal the caller retries on (spec.md sec 4.8).
#[must_use]
pub fn extract_yaml_block(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```ya?ml\s*\n(.*?)\n?```").expect("static regex is valid");
    re.captures(text).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_fenced_yaml_block() {
        let text = "preamble\n```yaml\nkey: value\n```\ntrailer";
        assert_eq!(extract_yaml_block(text).as_deref(), Some("key: value"));
    }

    #[test]
    fn accepts_the_yml_alias() {
        let text = "```yml\na: 1\n```";
        assert_eq!(extract_yaml_block(text).as_deref(), Some("a: 1"));
    }

    #[test]
    fn returns_none_without_a_fenced_block() {
        assert_eq!(extract_yaml_block("no fences here"), None);
    }

    #[test]
    fn takes_the_first_block_when_several_are_present() {
        let text = "```yaml\nfirst: 1\n```\n```yaml\nsecond: 2\n```";
        assert_eq!(extract_yaml_block(text).as_deref(), Some("first: 1"));
    }
}
