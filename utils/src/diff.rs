//! Compact line diffs and stats for tool results.

use std::fmt::{self, Write as _};

use similar::{Change, ChangeTag, TextDiff};

/// Lines added and removed between two versions of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub additions: u32,
    pub deletions: u32,
}

impl DiffStats {
    #[must_use]
    pub fn between(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_lines(old, new);
        let mut stats = Self::default();
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => stats.additions += 1,
                ChangeTag::Delete => stats.deletions += 1,
                ChangeTag::Equal => {}
            }
        }
        stats
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.additions, self.deletions)
    }
}

/// Format a compact diff between old and new file content.
///
/// Each changed line is shown with its line number and one line of context on
/// either side. Runs of more than three unchanged lines between shown lines
/// collapse to `...`. Identical inputs produce the empty string.
#[must_use]
pub fn format_compact_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let changes: Vec<Change<&str>> = diff.iter_all_changes().collect();
    if changes.iter().all(|c| c.tag() == ChangeTag::Equal) {
        return String::new();
    }

    let max_line = old.lines().count().max(new.lines().count()).max(1);
    let width = max_line.to_string().len();
    let gap_marker = format!("{:>width$}\n", "...");

    let mut out = String::new();
    let mut last_shown: Option<usize> = None;
    for (i, change) in changes.iter().enumerate() {
        let (line_no, sign) = match change.tag() {
            ChangeTag::Equal => {
                let near_prev = i > 0 && changes[i - 1].tag() != ChangeTag::Equal;
                let near_next = changes
                    .get(i + 1)
                    .is_some_and(|c| c.tag() != ChangeTag::Equal);
                if !(near_prev || near_next) {
                    continue;
                }
                (change.old_index(), ' ')
            }
            ChangeTag::Delete => (change.old_index(), '-'),
            ChangeTag::Insert => (change.new_index(), '+'),
        };
        if let Some(last) = last_shown
            && i - last - 1 > 3
        {
            out.push_str(&gap_marker);
        }
        let line_no = line_no.map_or(0, |idx| idx + 1);
        let _ = writeln!(
            out,
            "{line_no:>width$} {sign}{}",
            change.value().trim_end_matches(['\n', '\r'])
        );
        last_shown = Some(i);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_changed_lines() {
        let stats = DiffStats::between("a\nb\nc\n", "a\nB\nc\nd\n");
        assert_eq!(
            stats,
            DiffStats {
                additions: 2,
                deletions: 1
            }
        );
        assert_eq!(stats.to_string(), "+2 -1");
        assert!(DiffStats::between("same\n", "same\n").is_empty());
    }

    #[test]
    fn identical_content_has_no_diff() {
        assert_eq!(format_compact_diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn shows_change_with_one_line_of_context() {
        let out = format_compact_diff("a\nb\nc\nd\n", "a\nb\nX\nd\n");
        assert_eq!(out, "2  b\n3 -c\n3 +X\n4  d\n");
    }

    #[test]
    fn distant_changes_are_separated_by_a_gap() {
        let old: String = (1..=20).map(|n| format!("line{n}\n")).collect();
        let new = old.replace("line2\n", "two\n").replace("line19\n", "nineteen\n");
        let out = format_compact_diff(&old, &new);
        assert!(out.contains("...\n"));
        assert!(out.contains(" -line2"));
        assert!(out.contains(" +nineteen"));
        assert!(!out.contains("line10"));
    }
}
