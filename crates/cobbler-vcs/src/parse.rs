use crate::types::{DiffShortStat, NameStatusEntry, NumstatEntry};

/// Parse `git diff --shortstat` output, e.g.:
/// " 3 files changed, 12 insertions(+), 4 deletions(-)"
#[must_use]
pub fn parse_shortstat(output: &str) -> DiffShortStat {
    let mut stat = DiffShortStat::default();
    for part in output.trim().split(',') {
        let part = part.trim();
        let Some((number, _rest)) = part.split_once(' ') else {
            continue;
        };
        let Ok(n) = number.parse::<u32>() else {
            continue;
        };
        if part.contains("file") {
            stat.files_changed = n;
        } else if part.contains("insertion") {
            stat.insertions = n;
        } else if part.contains("deletion") {
            stat.deletions = n;
        }
    }
    stat
}

/// Parse `git diff --name-status` output: one `<status>\t<path>` per line.
#[must_use]
pub fn parse_name_status(output: &str) -> Vec<NameStatusEntry> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let status = cols.next()?.to_string();
            let path = cols.next()?.to_string();
            Some(NameStatusEntry { status, path })
        })
        .collect()
}

/// Parse `git diff --numstat` output: one `<ins>\t<del>\t<path>` per line.
/// Binary files report `-` for both counts.
#[must_use]
pub fn parse_numstat(output: &str) -> Vec<NumstatEntry> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let insertions = cols.next()?;
            let deletions = cols.next()?;
            let path = cols.next()?.to_string();
            Some(NumstatEntry {
                insertions: insertions.parse().ok(),
                deletions: deletions.parse().ok(),
                path,
            })
        })
        .collect()
}
