//! Errors from parsing references and applying edit batches.

use std::fmt;

use crate::engine::EditKind;
use crate::hash::Fingerprint;
use crate::reference::LineReference;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Malformed line reference '{input}': {reason}")]
    MalformedReference { input: String, reason: &'static str },
    #[error("{0}")]
    StaleReference(StaleReference),
    #[error("Overlapping edits: line {line} is targeted by more than one replace_line/delete_line")]
    OverlappingEdits { line: u32 },
    #[error("{kind} requires content")]
    MissingContent { kind: EditKind },
}

/// A reference that no longer matches the content it addresses.
///
/// Never auto-corrected: the caller must re-read the file and compute fresh
/// references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleReference {
    pub reference: LineReference,
    pub reason: StaleReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// The referenced line number is past the end of the file.
    OutOfBounds { line_count: usize },
    /// The line at that position now has a different fingerprint.
    FingerprintMismatch { current: Fingerprint },
}

impl fmt::Display for StaleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.reference.line_number();
        match self.reason {
            StaleReason::OutOfBounds { line_count } => write!(
                f,
                "Stale reference {}: line {line} is past the end of the file ({line_count} lines); re-read the file",
                self.reference
            ),
            StaleReason::FingerprintMismatch { current } => write!(
                f,
                "Stale reference {}: line {line} is now {line}:{current}; re-read the file",
                self.reference
            ),
        }
    }
}

impl EditError {
    /// Whether re-reading the file and retrying with fresh references can succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StaleReference(_))
    }
}
