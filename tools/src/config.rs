//! Runtime settings for the dispatcher.
//!
//! Kept in the tools crate so `tether-config` can build them without the tools
//! crate depending on configuration loading.

use crate::policy::DEFAULT_MAX_MUTATING_CALLS_PER_TURN;
use crate::sandbox::WorkspaceRoot;

pub const DEFAULT_MAX_READ_CHARS: usize = 50_000;
pub const DEFAULT_MAX_TOOL_ARGS_BYTES: usize = 256 * 1024;
pub const DEFAULT_MAX_UNDO_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub workspace_root: WorkspaceRoot,
    pub max_mutating_calls_per_turn: usize,
    /// `read_file` output beyond this many bytes is truncated.
    pub max_read_chars: usize,
    /// Serialized argument size above which a call is rejected unread.
    pub max_tool_args_bytes: usize,
    /// Snapshots kept per path for `undo_edit`.
    pub max_undo_depth: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workspace_root: WorkspaceRoot::default(),
            max_mutating_calls_per_turn: DEFAULT_MAX_MUTATING_CALLS_PER_TURN,
            max_read_chars: DEFAULT_MAX_READ_CHARS,
            max_tool_args_bytes: DEFAULT_MAX_TOOL_ARGS_BYTES,
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
        }
    }
}
