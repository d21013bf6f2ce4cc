//! Commands behind the `tether` binary.

pub mod workspace;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_config::TetherConfig;
use tether_tools::{DispatchSettings, Dispatcher, ToolRegistry, WorkspaceRoot, policy_text};
use tether_types::{ToolCall, ToolResult};

pub use workspace::LocalWorkspace;

/// Settings from the config file, or defaults when there is none.
pub fn load_settings() -> Result<DispatchSettings> {
    let config = TetherConfig::load().context("loading configuration")?;
    Ok(config
        .map(|config| config.dispatch_settings())
        .unwrap_or_default())
}

/// All tool definitions in function-calling form.
pub fn schemas_json() -> Result<String> {
    serde_json::to_string_pretty(&ToolRegistry::global().function_tools())
        .context("serializing tool schemas")
}

pub fn policy(
    settings: &DispatchSettings,
    root: Option<&str>,
    max_mutating: Option<usize>,
) -> Result<String> {
    let root = match root {
        Some(root) => WorkspaceRoot::new(root)?,
        None => settings.workspace_root.clone(),
    };
    let max = max_mutating.unwrap_or(settings.max_mutating_calls_per_turn);
    Ok(policy_text(&root, max))
}

/// Anchored rendering of a local file.
pub fn read_anchored(path: &Path, start: Option<u32>, end: Option<u32>) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(tether_edit::render_anchored(&content, start, end))
}

/// One entry of `tether call` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallReport {
    Result(ToolResult),
    /// Valid call for a tool that runs outside this process.
    Forward { name: String, arguments: Value },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CallBatch {
    One(ToolCall),
    Many(Vec<ToolCall>),
}

/// Parse a call, or an array of calls forming one turn, from JSON.
pub fn parse_calls(input: &str) -> Result<Vec<ToolCall>> {
    let batch: CallBatch = serde_json::from_str(input.trim())
        .context("expected a tool call {\"name\", \"arguments\"} or an array of them")?;
    let mut calls = match batch {
        CallBatch::One(call) => vec![call],
        CallBatch::Many(calls) => calls,
    };
    if calls.is_empty() {
        bail!("no tool calls given");
    }
    for (idx, call) in calls.iter_mut().enumerate() {
        if call.id.is_empty() {
            call.id = format!("call_{}", idx + 1);
        }
    }
    Ok(calls)
}

/// Dispatch `calls` as one agent turn against a local directory.
pub fn run_calls(
    root: &Path,
    mut settings: DispatchSettings,
    calls: &[ToolCall],
) -> Result<Vec<CallReport>> {
    let workspace = LocalWorkspace::open(root)
        .with_context(|| format!("opening workspace {}", root.display()))?;
    settings.workspace_root = WorkspaceRoot::new(workspace.root())?;
    tracing::info!(root = %settings.workspace_root, calls = calls.len(), "Dispatching tool calls");

    let mut dispatcher = Dispatcher::new(workspace, settings);
    dispatcher.begin_turn();
    Ok(calls
        .iter()
        .map(|call| match dispatcher.handle(call) {
            Ok(result) => CallReport::Result(result),
            Err(validated) => CallReport::Forward {
                name: validated.kind.name().to_string(),
                arguments: validated.arguments,
            },
        })
        .collect())
}
