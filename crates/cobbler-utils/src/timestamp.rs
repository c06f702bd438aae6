//! `YYYY-MM-DD-HH-MM-SS` local-time timestamps used for generation names
//! (spec §3) and scratch-history file names (spec §4.11).

use chrono::{DateTime, Local, Utc};

/// Format `now` (local time) as `YYYY-MM-DD-HH-MM-SS`.
#[must_use]
pub fn now_stamp() -> String {
    stamp(Local::now().with_timezone(&Utc))
}

/// Format an arbitrary instant as `YYYY-MM-DD-HH-MM-SS`.
#[must_use]
pub fn stamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Build a generation name: `<prefix>-<timestamp>`.
#[must_use]
pub fn generation_name(prefix: &str, timestamp: &str) -> String {
    format!("{prefix}-{timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_format_is_fixed_width() {
        let at = Utc.with_ymd_and_hms(2026, 7, 27, 9, 5, 3).unwrap();
        let s = stamp(at);
        assert_eq!(s.len(), 19);
        assert!(s.chars().filter(|c| *c == '-').count() == 5);
    }

    #[test]
    fn generation_name_composes_prefix_and_stamp() {
        assert_eq!(
            generation_name("gen", "2026-07-27-09-05-03"),
            "gen-2026-07-27-09-05-03"
        );
    }
}
