//! Behavioral policy around tool dispatch.
//!
//! The same rules are stated to the model in [`policy_text`] and enforced by
//! the dispatcher: workspace-root confinement (see [`crate::sandbox`]), the
//! `edit_file` preference, and a cap on mutating calls per agent turn.

use serde_json::Value;

use crate::kind::ToolKind;
use crate::sandbox::WorkspaceRoot;
use crate::{DenialReason, ToolError};

pub const DEFAULT_MAX_MUTATING_CALLS_PER_TURN: usize = 20;

/// Programs whose invocation never changes workspace state.
const READ_ONLY_PROGRAMS: &[&str] = &[
    "ls", "cat", "head", "tail", "wc", "grep", "rg", "find", "pwd", "echo", "stat", "file",
    "tree", "du",
];

const READ_ONLY_GIT_SUBCOMMANDS: &[&str] = &["status", "diff", "log", "show"];

/// `find` actions that delete, run commands or write files.
const FIND_ACTIONS_WITH_EFFECTS: &[&str] = &[
    "-delete", "-exec", "-execdir", "-ok", "-okdir", "-fprint", "-fprint0", "-fprintf", "-fls",
];

/// Policy instructions embedded in the agent's system prompt.
#[must_use]
pub fn policy_text(root: &WorkspaceRoot, max_mutating_calls_per_turn: usize) -> String {
    format!(
        "## Tool policy\n\
         \n\
         - All file paths must stay inside the workspace root `{root}`. Relative paths are \
         resolved against the workspace root; paths that escape it are rejected.\n\
         - Prefer `edit_file` over `write_file` for targeted modifications. Use `write_file` \
         only to create a file or to replace most of its content.\n\
         - `edit_file` addresses lines by the `<line>:<hash>` anchors printed by `read_file`. \
         All anchors in one call refer to the same read. If a reference is stale, re-read the \
         file and retry with fresh anchors.\n\
         - At most {max_mutating_calls_per_turn} mutating tool calls are accepted per turn \
         (write_file, edit_file, undo_edit, git_commit, save_memory, and exec commands that \
         change state). Calls beyond the limit are rejected.\n"
    )
}

/// Whether a call to `kind` with `arguments` counts against the per-turn cap.
#[must_use]
pub fn is_mutating(kind: ToolKind, arguments: &Value) -> bool {
    match kind {
        ToolKind::WriteFile
        | ToolKind::EditFile
        | ToolKind::UndoEdit
        | ToolKind::GitCommit
        | ToolKind::SaveMemory => true,
        ToolKind::Exec => arguments
            .get("command")
            .and_then(Value::as_str)
            .is_none_or(|command| !is_read_only_command(command)),
        ToolKind::ReadFile
        | ToolKind::ListDir
        | ToolKind::SearchFiles
        | ToolKind::WebSearch
        | ToolKind::ReadSymbols
        | ToolKind::GitStatus
        | ToolKind::GitDiff
        | ToolKind::CoderUpdateState => false,
    }
}

/// Conservative classification of a shell command as read-only.
///
/// Anything the classifier does not recognize counts as mutating.
#[must_use]
pub fn is_read_only_command(command: &str) -> bool {
    if command.trim().is_empty()
        || command.contains('>')
        || command.contains('`')
        || command.contains("$(")
    {
        return false;
    }
    command
        .split(['|', ';', '&', '\n'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .all(is_read_only_segment)
}

fn is_read_only_segment(segment: &str) -> bool {
    let mut args = segment.split_whitespace();
    let Some(program) = args.next() else {
        return false;
    };
    match program {
        "git" => {
            args.next()
                .is_some_and(|sub| READ_ONLY_GIT_SUBCOMMANDS.contains(&sub))
                && !args.any(|arg| arg.starts_with("--output"))
        }
        "find" => !args.any(|arg| FIND_ACTIONS_WITH_EFFECTS.contains(&arg)),
        "tree" => !args.any(|arg| arg.starts_with("-o")),
        "rg" => !args.any(|arg| arg.starts_with("--pre")),
        _ => READ_ONLY_PROGRAMS.contains(&program),
    }
}

/// Counter of mutating calls accepted in the current turn.
#[derive(Debug, Clone)]
pub struct MutationBudget {
    limit: usize,
    used: usize,
}

impl MutationBudget {
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Start a new turn.
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Take one slot, or reject the call when the turn's cap is reached.
    pub fn try_consume(&mut self) -> Result<(), ToolError> {
        if self.used >= self.limit {
            return Err(ToolError::PolicyViolation(
                DenialReason::MutationLimitExceeded { limit: self.limit },
            ));
        }
        self.used += 1;
        Ok(())
    }

    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }
}
