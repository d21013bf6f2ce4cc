//! The closed set of agent-callable tools.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadFile,
    ListDir,
    SearchFiles,
    WebSearch,
    Exec,
    WriteFile,
    EditFile,
    UndoEdit,
    ReadSymbols,
    GitStatus,
    GitDiff,
    GitCommit,
    SaveMemory,
    CoderUpdateState,
}

impl ToolKind {
    /// Every tool, in catalog order.
    pub const ALL: [Self; 14] = [
        Self::ReadFile,
        Self::ListDir,
        Self::SearchFiles,
        Self::WebSearch,
        Self::Exec,
        Self::WriteFile,
        Self::EditFile,
        Self::UndoEdit,
        Self::ReadSymbols,
        Self::GitStatus,
        Self::GitDiff,
        Self::GitCommit,
        Self::SaveMemory,
        Self::CoderUpdateState,
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "read_file" => Some(Self::ReadFile),
            "list_dir" => Some(Self::ListDir),
            "search_files" => Some(Self::SearchFiles),
            "web_search" => Some(Self::WebSearch),
            "exec" => Some(Self::Exec),
            "write_file" => Some(Self::WriteFile),
            "edit_file" => Some(Self::EditFile),
            "undo_edit" => Some(Self::UndoEdit),
            "read_symbols" => Some(Self::ReadSymbols),
            "git_status" => Some(Self::GitStatus),
            "git_diff" => Some(Self::GitDiff),
            "git_commit" => Some(Self::GitCommit),
            "save_memory" => Some(Self::SaveMemory),
            "coder_update_state" => Some(Self::CoderUpdateState),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadFile => "read_file",
            Self::ListDir => "list_dir",
            Self::SearchFiles => "search_files",
            Self::WebSearch => "web_search",
            Self::Exec => "exec",
            Self::WriteFile => "write_file",
            Self::EditFile => "edit_file",
            Self::UndoEdit => "undo_edit",
            Self::ReadSymbols => "read_symbols",
            Self::GitStatus => "git_status",
            Self::GitDiff => "git_diff",
            Self::GitCommit => "git_commit",
            Self::SaveMemory => "save_memory",
            Self::CoderUpdateState => "coder_update_state",
        }
    }

    /// Position in [`ToolKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Argument fields holding workspace paths (a string, or an array of strings).
    #[must_use]
    pub const fn path_fields(self) -> &'static [&'static str] {
        match self {
            Self::ReadFile
            | Self::ListDir
            | Self::SearchFiles
            | Self::WriteFile
            | Self::EditFile
            | Self::UndoEdit
            | Self::ReadSymbols
            | Self::GitDiff => &["path"],
            Self::GitCommit => &["paths"],
            Self::Exec => &["workdir"],
            Self::WebSearch | Self::GitStatus | Self::SaveMemory | Self::CoderUpdateState => &[],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool name as proposed by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    Known(ToolKind),
    Unknown(String),
}

impl ToolName {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        ToolKind::from_name(name).map_or_else(|| Self::Unknown(name.to_string()), Self::Known)
    }
}
