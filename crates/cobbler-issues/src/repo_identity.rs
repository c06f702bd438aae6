//! Resolve which `owner/repo` the issue store talks to (spec.md sec 4.3:
//! "detect the remote repo identity (explicit override -> remote query ->
//! parse module metadata)").

/// Try, in order: an explicit config override, a `git remote` URL, and a
/// Go-style module path (`github.com/owner/repo/...`). The first source that
/// yields a parseable `owner/repo` wins.
#[must_use]
pub fn detect_repo_identity(
    explicit_override: Option<&str>,
    remote_url: Option<&str>,
    module_path: Option<&str>,
) -> Option<String> {
    if let Some(explicit) = explicit_override {
        return Some(explicit.to_string());
    }
    if let Some(url) = remote_url
        && let Some(identity) = parse_github_remote_url(url)
    {
        return Some(identity);
    }
    if let Some(module) = module_path
        && let Some(identity) = parse_module_path(module)
    {
        return Some(identity);
    }
    None
}

/// Parse `owner/repo` out of common GitHub remote URL shapes:
/// `git@github.com:owner/repo.git`, `https://github.com/owner/repo.git`,
/// `https://github.com/owner/repo`.
fn parse_github_remote_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches(".git");
    let after_host = trimmed
        .split_once("github.com:")
        .or_else(|| trimmed.split_once("github.com/"))
        .map(|(_, rest)| rest)?;
    let mut parts = after_host.splitn(2, '/');
    let owner = parts.next()?;
    let repo = parts.next()?.trim_end_matches('/');
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{owner}/{repo}"))
}

/// Parse `owner/repo` out of a Go-style module path: `github.com/owner/repo`
/// or `github.com/owner/repo/v2`.
fn parse_module_path(module_path: &str) -> Option<String> {
    let rest = module_path.strip_prefix("github.com/")?;
    let mut parts = rest.splitn(3, '/');
    let owner = parts.next()?;
    let repo = parts.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{owner}/{repo}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        assert_eq!(
            detect_repo_identity(Some("a/b"), Some("git@github.com:c/d.git"), Some("github.com/e/f")),
            Some("a/b".to_string())
        );
    }

    #[test]
    fn falls_back_to_remote_url() {
        assert_eq!(
            detect_repo_identity(None, Some("git@github.com:c/d.git"), Some("github.com/e/f")),
            Some("c/d".to_string())
        );
        assert_eq!(
            detect_repo_identity(None, Some("https://github.com/c/d.git"), None),
            Some("c/d".to_string())
        );
    }

    #[test]
    fn falls_back_to_module_path() {
        assert_eq!(
            detect_repo_identity(None, None, Some("github.com/e/f")),
            Some("e/f".to_string())
        );
        assert_eq!(
            detect_repo_identity(None, None, Some("github.com/e/f/v2")),
            Some("e/f".to_string())
        );
    }

    #[test]
    fn no_source_yields_none() {
        assert_eq!(detect_repo_identity(None, None, None), None);
        assert_eq!(detect_repo_identity(None, Some("https://gitlab.com/c/d"), None), None);
    }
}
