//! Byte budget enforcement (spec.md sec 4.4 "Byte budget", invariant I7) and
//! the required-reading filter applied when executing a task.

use crate::gather::SourceFile;

fn file_size(file: &SourceFile) -> usize {
    file.path.len() + file.numbered_content.len()
}

/// Drop source files from the end of the sorted list, one at a time, until
/// `fixed_overhead + sum(file sizes) <= max_bytes` or only one file remains
/// (spec.md sec 4.4, invariant I7: the budget never empties the set
/// entirely when more than one file is present).
#[must_use]
pub fn apply_byte_budget(mut files: Vec<SourceFile>, fixed_overhead: usize, max_bytes: usize) -> Vec<SourceFile> {
    loop {
        let total: usize = fixed_overhead + files.iter().map(file_size).sum::<usize>();
        if total <= max_bytes || files.len() <= 1 {
            return files;
        }
        files.pop();
    }
}

/// Restrict `files` to those whose path suffix-matches an entry in
/// `required_reading` (spec.md sec 4.4: applied only when executing a task,
/// not for the propose prompt).
#[must_use]
pub fn filter_required_reading(files: Vec<SourceFile>, required_reading: &[String]) -> Vec<SourceFile> {
    if required_reading.is_empty() {
        return Vec::new();
    }
    files
        .into_iter()
        .filter(|f| required_reading.iter().any(|req| f.path.ends_with(req.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, bytes: usize) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            numbered_content: "x".repeat(bytes),
        }
    }

    #[test]
    fn drops_from_the_end_until_within_budget() {
        let files = vec![file("a.rs", 100), file("b.rs", 100), file("c.rs", 100)];
        let trimmed = apply_byte_budget(files, 0, 210);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].path, "a.rs");
        assert_eq!(trimmed[1].path, "b.rs");
    }

    #[test]
    fn never_drops_below_one_file() {
        let files = vec![file("a.rs", 1000)];
        let trimmed = apply_byte_budget(files, 0, 1);
        assert_eq!(trimmed.len(), 1);
    }

    #[test]
    fn within_budget_is_a_no_op() {
        let files = vec![file("a.rs", 10), file("b.rs", 10)];
        let trimmed = apply_byte_budget(files.clone(), 0, 1000);
        assert_eq!(trimmed, files);
    }

    #[test]
    fn required_reading_keeps_only_suffix_matches() {
        let files = vec![file("src/a.rs", 1), file("src/b/c.rs", 1)];
        let kept = filter_required_reading(files, &["b/c.rs".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].path, "src/b/c.rs");
    }

    #[test]
    fn empty_required_reading_yields_no_files() {
        let files = vec![file("src/a.rs", 1)];
        assert!(filter_required_reading(files, &[]).is_empty());
    }
}
