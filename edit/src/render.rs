//! Anchored rendering for `read_file`.

use std::fmt::Write as _;

use crate::hash::Fingerprint;
use crate::reference::LineReference;
use crate::text::split_lines;

/// Render `content` as `"<n>:<fingerprint>|<text>"` lines.
///
/// `start_line` and `end_line` are 1-indexed and inclusive; both are clamped to
/// the file. An empty range renders as the empty string.
#[must_use]
pub fn render_anchored(content: &str, start_line: Option<u32>, end_line: Option<u32>) -> String {
    let lines = split_lines(content);
    let start = start_line.unwrap_or(1).max(1) as usize;
    let end = end_line.map_or(lines.len(), |end| (end as usize).min(lines.len()));

    let mut out = String::new();
    if start > end {
        return out;
    }
    for (idx, line) in lines[start - 1..end].iter().enumerate() {
        let number = start + idx;
        let _ = writeln!(out, "{number}:{}|{line}", Fingerprint::of(line));
    }
    out
}

/// References to every line of `content`, in order.
#[must_use]
pub fn anchors(content: &str) -> Vec<LineReference> {
    let lines = split_lines(content);
    (1..=lines.len() as u32)
        .filter_map(|n| LineReference::capture(&lines, n))
        .collect()
}
