//! Atomic batches of line edits.
//!
//! Every reference in a batch addresses the line numbering of the content the
//! batch is applied to, i.e. the agent's single snapshot of the file. Edits are
//! applied bottom to top so that an edit never shifts the position of a target
//! that has not been processed yet.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::reference::{LineReference, resolve};
use crate::text::{Document, Line, LineEnding, split_block};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    ReplaceLine,
    InsertAfter,
    InsertBefore,
    DeleteLine,
}

impl EditKind {
    pub const ALL: [Self; 4] = [
        Self::ReplaceLine,
        Self::InsertAfter,
        Self::InsertBefore,
        Self::DeleteLine,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceLine => "replace_line",
            Self::InsertAfter => "insert_after",
            Self::InsertBefore => "insert_before",
            Self::DeleteLine => "delete_line",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    #[must_use]
    pub const fn requires_content(self) -> bool {
        !matches!(self, Self::DeleteLine)
    }

    /// Whether the edit removes the referenced line.
    const fn consumes_target(self) -> bool {
        matches!(self, Self::ReplaceLine | Self::DeleteLine)
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line edit. `content` may span several lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireEdit")]
pub enum EditOperation {
    ReplaceLine {
        reference: LineReference,
        content: String,
    },
    InsertAfter {
        reference: LineReference,
        content: String,
    },
    InsertBefore {
        reference: LineReference,
        content: String,
    },
    DeleteLine {
        reference: LineReference,
    },
}

impl EditOperation {
    #[must_use]
    pub const fn kind(&self) -> EditKind {
        match self {
            Self::ReplaceLine { .. } => EditKind::ReplaceLine,
            Self::InsertAfter { .. } => EditKind::InsertAfter,
            Self::InsertBefore { .. } => EditKind::InsertBefore,
            Self::DeleteLine { .. } => EditKind::DeleteLine,
        }
    }

    #[must_use]
    pub const fn reference(&self) -> &LineReference {
        match self {
            Self::ReplaceLine { reference, .. }
            | Self::InsertAfter { reference, .. }
            | Self::InsertBefore { reference, .. }
            | Self::DeleteLine { reference } => reference,
        }
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::ReplaceLine { content, .. }
            | Self::InsertAfter { content, .. }
            | Self::InsertBefore { content, .. } => Some(content),
            Self::DeleteLine { .. } => None,
        }
    }

    fn block(&self) -> Vec<String> {
        self.content().map(split_block).unwrap_or_default()
    }
}

/// `edit_file` wire form of one edit: `{ "op", "ref", "content"? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEdit {
    pub op: EditKind,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl TryFrom<WireEdit> for EditOperation {
    type Error = EditError;

    fn try_from(wire: WireEdit) -> Result<Self, Self::Error> {
        let reference = LineReference::parse(&wire.reference)?;
        let content = match (wire.op.requires_content(), wire.content) {
            (true, Some(content)) => content,
            (true, None) => return Err(EditError::MissingContent { kind: wire.op }),
            // Content on delete_line is ignored.
            (false, _) => return Ok(Self::DeleteLine { reference }),
        };
        Ok(match wire.op {
            EditKind::ReplaceLine => Self::ReplaceLine { reference, content },
            EditKind::InsertAfter => Self::InsertAfter { reference, content },
            EditKind::InsertBefore => Self::InsertBefore { reference, content },
            EditKind::DeleteLine => Self::DeleteLine { reference },
        })
    }
}

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedEdit {
    pub op: EditKind,
    /// Physical 1-indexed line where the inserted block started when the
    /// operation was applied (for `delete_line`, where the removed line was).
    /// Edits higher up in the same batch are applied later and shift it.
    pub line: u32,
    pub lines_inserted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditBatchResult {
    pub content: String,
    /// One entry per input operation, in input order.
    pub applied: Vec<AppliedEdit>,
}

/// Apply `edits` to `content` as one atomic batch.
///
/// Operations targeting the same line are grouped: their blocks are laid out
/// as every `insert_before` (input order), then the replacement, then every
/// `insert_after` (input order). At most one `replace_line`/`delete_line` may
/// target a given line.
pub fn apply(content: &str, edits: &[EditOperation]) -> Result<EditBatchResult, EditError> {
    if edits.is_empty() {
        return Ok(EditBatchResult {
            content: content.to_string(),
            applied: Vec::new(),
        });
    }

    let mut doc = Document::parse(content);
    let mut order: Vec<usize> = (0..edits.len()).collect();
    // Stable: operations on the same line keep their input order.
    order.sort_by_key(|&idx| std::cmp::Reverse(edits[idx].reference().line_number()));

    let mut applied: Vec<Option<AppliedEdit>> = vec![None; edits.len()];
    for group in order.chunk_by(|&a, &b| {
        edits[a].reference().line_number() == edits[b].reference().line_number()
    }) {
        let line = edits[group[0]].reference().line_number();
        if group.iter().filter(|&&idx| edits[idx].kind().consumes_target()).count() > 1 {
            return Err(EditError::OverlappingEdits { line });
        }

        let mut target = None;
        for &idx in group {
            target = Some(resolve(&doc.lines, edits[idx].reference())?);
        }
        let Some(target) = target else {
            continue;
        };
        apply_group(&mut doc.lines, doc.line_ending, target, group, edits, &mut applied);
    }

    Ok(EditBatchResult {
        content: doc.render(),
        applied: applied.into_iter().flatten().collect(),
    })
}

/// Rewrite the line at `target` with every operation in `group`.
fn apply_group(
    lines: &mut Vec<Line>,
    ending: LineEnding,
    target: usize,
    group: &[usize],
    edits: &[EditOperation],
    applied: &mut [Option<AppliedEdit>],
) {
    let mut block: Vec<Line> = Vec::new();
    let mut record = |idx: usize, block: &mut Vec<Line>, inserted: Vec<String>| {
        applied[idx] = Some(AppliedEdit {
            op: edits[idx].kind(),
            line: (target + block.len() + 1) as u32,
            lines_inserted: inserted.len(),
        });
        block.extend(inserted.into_iter().map(|text| Line::inserted(text, ending)));
    };

    for &idx in group {
        if edits[idx].kind() == EditKind::InsertBefore {
            record(idx, &mut block, edits[idx].block());
        }
    }

    match group
        .iter()
        .copied()
        .find(|&idx| edits[idx].kind().consumes_target())
    {
        Some(idx) => record(idx, &mut block, edits[idx].block()),
        None => block.push(std::mem::take(&mut lines[target])),
    }

    for &idx in group {
        if edits[idx].kind() == EditKind::InsertAfter {
            record(idx, &mut block, edits[idx].block());
        }
    }

    lines.splice(target..=target, block);
}
