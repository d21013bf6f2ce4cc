//! Tool-call dispatch for one agent session.
//!
//! Every call passes the same gates in order: argument size, schema
//! validation, workspace confinement, then the per-turn mutation budget. Calls
//! that clear them are either executed here (the file tools, which need the
//! edit engine) or handed back as [`DispatchOutcome::Forward`] for the
//! orchestrator's own collaborators.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tether_edit::{AppliedEdit, render_anchored, split_lines};
use tether_types::{ToolCall, ToolResult};
use tether_utils::{DiffStats, format_compact_diff};

use crate::config::DispatchSettings;
use crate::kind::ToolKind;
use crate::policy::{MutationBudget, is_mutating, policy_text};
use crate::validator::{ToolValidator, ValidatedCall, edit_operations};
use crate::{DenialReason, ToolError, parse_args, truncate_output};

/// Failure reported by the workspace filesystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileAccessError {
    #[error("file does not exist")]
    NotFound,
    #[error("{0}")]
    Io(String),
}

/// Text access to the sandbox filesystem, by already-confined absolute path.
pub trait WorkspaceFiles {
    fn read_text(&self, path: &Path) -> Result<String, FileAccessError>;
    fn write_text(&mut self, path: &Path, content: &str) -> Result<(), FileAccessError>;
    fn remove_file(&mut self, path: &Path) -> Result<(), FileAccessError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The tool ran here; `output` is the text the agent sees.
    Completed { kind: ToolKind, output: String },
    /// The call is valid and within policy; the orchestrator executes it.
    Forward(ValidatedCall),
}

impl DispatchOutcome {
    /// Transcript entry for a completed call. Forwarded calls have none yet.
    #[must_use]
    pub fn into_tool_result(self, call: &ToolCall) -> Option<ToolResult> {
        match self {
            Self::Completed { output, .. } => {
                Some(ToolResult::success(&call.id, &call.name, output))
            }
            Self::Forward(_) => None,
        }
    }
}

/// Transcript entry for a failed or rejected call.
#[must_use]
pub fn tool_error_result(call: &ToolCall, err: &ToolError) -> ToolResult {
    let message = match err {
        ToolError::UnknownTool { name } => {
            format!("Unknown tool: {name}. Use one of the tools listed in your instructions.")
        }
        ToolError::InvalidArgument { field, message } => {
            format!("Invalid argument '{field}': {message}")
        }
        ToolError::Edit(edit) if edit.is_recoverable() => edit.to_string(),
        ToolError::Edit(edit) => format!("Edit rejected: {edit}"),
        ToolError::PolicyViolation(reason) => format!("Rejected by policy: {reason}"),
        ToolError::Workspace { path, message } => format!("{}: {message}", path.display()),
    };
    ToolResult::error(&call.id, &call.name, message)
}

/// Pre-mutation contents per path, newest last. `None` means the path did not
/// exist.
#[derive(Debug, Default)]
struct UndoJournal {
    depth: usize,
    snapshots: HashMap<PathBuf, VecDeque<Option<String>>>,
}

impl UndoJournal {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            snapshots: HashMap::new(),
        }
    }

    fn record(&mut self, path: &Path, previous: Option<String>) {
        if self.depth == 0 {
            return;
        }
        let stack = self.snapshots.entry(path.to_path_buf()).or_default();
        stack.push_back(previous);
        while stack.len() > self.depth {
            stack.pop_front();
        }
    }

    fn take(&mut self, path: &Path) -> Option<Option<String>> {
        let stack = self.snapshots.get_mut(path)?;
        let snapshot = stack.pop_back();
        if stack.is_empty() {
            self.snapshots.remove(path);
        }
        snapshot
    }

    fn restore(&mut self, path: &Path, snapshot: Option<String>) {
        self.snapshots
            .entry(path.to_path_buf())
            .or_default()
            .push_back(snapshot);
    }

    fn depth_of(&self, path: &Path) -> usize {
        self.snapshots.get(path).map_or(0, VecDeque::len)
    }
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
    #[serde(default)]
    start_line: Option<u32>,
    #[serde(default)]
    end_line: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    path: String,
}

pub struct Dispatcher<F> {
    files: F,
    settings: DispatchSettings,
    budget: MutationBudget,
    undo: UndoJournal,
}

impl<F: WorkspaceFiles> Dispatcher<F> {
    pub fn new(files: F, settings: DispatchSettings) -> Self {
        let budget = MutationBudget::new(settings.max_mutating_calls_per_turn);
        let undo = UndoJournal::new(settings.max_undo_depth);
        Self {
            files,
            settings,
            budget,
            undo,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    #[must_use]
    pub fn budget(&self) -> &MutationBudget {
        &self.budget
    }

    #[must_use]
    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn into_files(self) -> F {
        self.files
    }

    /// Policy instructions matching these settings.
    #[must_use]
    pub fn policy_text(&self) -> String {
        policy_text(
            &self.settings.workspace_root,
            self.settings.max_mutating_calls_per_turn,
        )
    }

    /// Start a new agent turn; the mutation budget is refilled.
    pub fn begin_turn(&mut self) {
        self.budget.reset();
    }

    /// Gate `call` and run it if it is a file tool.
    pub fn dispatch(&mut self, call: &ToolCall) -> Result<DispatchOutcome, ToolError> {
        let validated = self.admit(call).inspect_err(|err| {
            tracing::warn!(tool = %call.name, id = %call.id, error = %err, "Rejected tool call");
        })?;
        let kind = validated.kind;
        tracing::debug!(
            tool = %kind,
            id = %call.id,
            mutations_used = self.budget.used(),
            "Accepted tool call"
        );

        let output = match kind {
            ToolKind::ReadFile => self.read_file(&validated.arguments),
            ToolKind::WriteFile => self.write_file(&validated.arguments),
            ToolKind::EditFile => self.edit_file(&validated.arguments),
            ToolKind::UndoEdit => self.undo_edit(&validated.arguments),
            ToolKind::ListDir
            | ToolKind::SearchFiles
            | ToolKind::WebSearch
            | ToolKind::Exec
            | ToolKind::ReadSymbols
            | ToolKind::GitStatus
            | ToolKind::GitDiff
            | ToolKind::GitCommit
            | ToolKind::SaveMemory
            | ToolKind::CoderUpdateState => return Ok(DispatchOutcome::Forward(validated)),
        };
        match output {
            Ok(output) => Ok(DispatchOutcome::Completed { kind, output }),
            Err(err) => {
                tracing::warn!(tool = %kind, id = %call.id, error = %err, "Tool call failed");
                Err(err)
            }
        }
    }

    /// Dispatch and convert the result for the transcript.
    ///
    /// Returns the validated call instead when it must be forwarded.
    pub fn handle(&mut self, call: &ToolCall) -> Result<ToolResult, ValidatedCall> {
        match self.dispatch(call) {
            Ok(DispatchOutcome::Forward(validated)) => Err(validated),
            Ok(DispatchOutcome::Completed { output, .. }) => {
                Ok(ToolResult::success(&call.id, &call.name, output))
            }
            Err(err) => Ok(tool_error_result(call, &err)),
        }
    }

    fn admit(&mut self, call: &ToolCall) -> Result<ValidatedCall, ToolError> {
        let args_size = serde_json::to_vec(&call.arguments).map_or(0, |v| v.len());
        if args_size > self.settings.max_tool_args_bytes {
            return Err(ToolError::PolicyViolation(
                DenialReason::ArgumentsTooLarge {
                    size: args_size,
                    limit: self.settings.max_tool_args_bytes,
                },
            ));
        }

        let validated = ToolValidator::default().validate(&call.name, &call.arguments)?;
        self.confine(&validated)?;
        if is_mutating(validated.kind, &validated.arguments) {
            self.budget.try_consume()?;
        }
        Ok(validated)
    }

    fn confine(&self, call: &ValidatedCall) -> Result<(), ToolError> {
        let root = &self.settings.workspace_root;
        for field in call.kind.path_fields() {
            match call.arguments.get(*field) {
                Some(Value::String(path)) => {
                    root.resolve(path)?;
                }
                Some(Value::Array(paths)) => {
                    for path in paths.iter().filter_map(Value::as_str) {
                        root.resolve(path)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_file(&self, args: &Value) -> Result<String, ToolError> {
        let args: ReadFileArgs = parse_args(args)?;
        let path = self.settings.workspace_root.resolve(&args.path)?;
        let content = self.read(&path)?;
        if content.is_empty() {
            return Ok(format!("{} is empty", self.display(&path)));
        }
        let rendered = render_anchored(&content, args.start_line, args.end_line);
        if rendered.is_empty() {
            return Ok(format!(
                "No lines in the requested range; {} has {} lines",
                self.display(&path),
                split_lines(&content).len()
            ));
        }
        Ok(truncate_output(rendered, self.settings.max_read_chars))
    }

    fn write_file(&mut self, args: &Value) -> Result<String, ToolError> {
        let args: WriteFileArgs = parse_args(args)?;
        let path = self.settings.workspace_root.resolve(&args.path)?;
        let previous = self.read_existing(&path)?;
        self.write(&path, &args.content)?;

        let display = self.display(&path);
        let output = match &previous {
            None => format!(
                "Created {display} ({} lines)",
                split_lines(&args.content).len()
            ),
            Some(old) => summarize_change(&format!("Wrote {display}"), old, &args.content),
        };
        self.undo.record(&path, previous);
        Ok(output)
    }

    fn edit_file(&mut self, args: &Value) -> Result<String, ToolError> {
        let PathArgs { path } = parse_args(args)?;
        let operations = edit_operations(args)?;
        let path = self.settings.workspace_root.resolve(&path)?;
        let display = self.display(&path);

        let original = match self.files.read_text(&path) {
            Ok(content) => content,
            Err(FileAccessError::NotFound) => {
                return Err(ToolError::Workspace {
                    path,
                    message: "file does not exist; create it with write_file".to_string(),
                });
            }
            Err(err) => return Err(workspace_error(&path, &err)),
        };

        let result = tether_edit::apply(&original, &operations)?;
        if result.content == original {
            return Ok(format!(
                "No changes to {display} ({} edits applied)",
                result.applied.len()
            ));
        }
        self.write(&path, &result.content)?;
        self.undo.record(&path, Some(original.clone()));

        let mut output = format!(
            "Applied {} edits to {display} ({})\n",
            result.applied.len(),
            DiffStats::between(&original, &result.content)
        );
        for applied in &result.applied {
            output.push_str(&describe_applied(applied));
        }
        let diff = format_compact_diff(&original, &result.content);
        if !diff.is_empty() {
            output.push('\n');
            output.push_str(&diff);
        }
        output.push_str("\nLine anchors changed; re-read the file before further edits.");
        Ok(output)
    }

    fn undo_edit(&mut self, args: &Value) -> Result<String, ToolError> {
        let PathArgs { path } = parse_args(args)?;
        let path = self.settings.workspace_root.resolve(&path)?;
        let Some(snapshot) = self.undo.take(&path) else {
            return Err(ToolError::invalid(
                "path",
                "no write_file or edit_file on this path to undo",
            ));
        };

        let current = match self.read_existing(&path) {
            Ok(current) => current.unwrap_or_default(),
            Err(err) => {
                self.undo.restore(&path, snapshot);
                return Err(err);
            }
        };
        let display = self.display(&path);
        let applied = match &snapshot {
            Some(previous) => self.write(&path, previous),
            None => self
                .files
                .remove_file(&path)
                .map_err(|err| workspace_error(&path, &err)),
        };
        if let Err(err) = applied {
            self.undo.restore(&path, snapshot);
            return Err(err);
        }

        let remaining = self.undo.depth_of(&path);
        Ok(match snapshot {
            Some(previous) => format!(
                "{}\n{remaining} earlier versions remain",
                summarize_change(&format!("Reverted {display}"), &current, &previous)
            ),
            None => format!("Removed {display}, which did not exist before write_file"),
        })
    }

    fn read(&self, path: &Path) -> Result<String, ToolError> {
        self.files
            .read_text(path)
            .map_err(|err| workspace_error(path, &err))
    }

    fn read_existing(&self, path: &Path) -> Result<Option<String>, ToolError> {
        match self.files.read_text(path) {
            Ok(content) => Ok(Some(content)),
            Err(FileAccessError::NotFound) => Ok(None),
            Err(err) => Err(workspace_error(path, &err)),
        }
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), ToolError> {
        self.files
            .write_text(path, content)
            .map_err(|err| workspace_error(path, &err))
    }

    fn display(&self, path: &Path) -> String {
        self.settings
            .workspace_root
            .relative(path)
            .display()
            .to_string()
    }
}

fn workspace_error(path: &Path, err: &FileAccessError) -> ToolError {
    ToolError::Workspace {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn describe_applied(applied: &AppliedEdit) -> String {
    let mut line = format!("- {} at line {}", applied.op, applied.line);
    if applied.lines_inserted > 0 {
        let _ = write!(line, ", {} lines inserted", applied.lines_inserted);
    }
    line.push('\n');
    line
}

fn summarize_change(headline: &str, old: &str, new: &str) -> String {
    let stats = DiffStats::between(old, new);
    let diff = format_compact_diff(old, new);
    if diff.is_empty() {
        format!("{headline} (no changes)")
    } else {
        format!("{headline} ({stats})\n\n{diff}")
    }
}
