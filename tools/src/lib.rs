//! Tool catalog and dispatch front end for the coding agent.
//!
//! - **`kind`**: the closed set of tool names
//! - **`registry`**: JSON schemas and wire definitions for every tool
//! - **`validator`**: argument checks run before any tool executes
//! - **`sandbox`**: workspace-root path confinement
//! - **`policy`**: agent-facing policy text and the per-turn mutation cap
//! - **`dispatch`**: the pipeline that gates calls and runs the file tools

pub mod config;
pub mod dispatch;
pub mod kind;
pub mod policy;
pub mod registry;
pub mod sandbox;
pub mod validator;

use std::path::PathBuf;

use serde_json::Value;
use tether_edit::EditError;

pub use config::DispatchSettings;
pub use dispatch::{
    DispatchOutcome, Dispatcher, FileAccessError, WorkspaceFiles, tool_error_result,
};
pub use kind::{ToolKind, ToolName};
pub use policy::{MutationBudget, is_mutating, is_read_only_command, policy_text};
pub use registry::{ToolRegistry, ToolSchema, definitions};
pub use sandbox::WorkspaceRoot;
pub use validator::{ToolValidator, ValidatedCall, validate};

/// Error types for tool validation, policy and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("Policy violation: {0}")]
    PolicyViolation(DenialReason),
    #[error("Workspace error for {path:?}: {message}")]
    Workspace { path: PathBuf, message: String },
}

impl ToolError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the call was refused before anything ran.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool { .. }
                | Self::InvalidArgument { .. }
                | Self::PolicyViolation(_)
                | Self::Edit(EditError::MalformedReference { .. } | EditError::MissingContent { .. })
        )
    }
}

/// Denial reason for confinement or per-turn limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    PathOutsideWorkspace { attempted: PathBuf, root: PathBuf },
    UnsafePath { attempted: String },
    MutationLimitExceeded { limit: usize },
    ArgumentsTooLarge { size: usize, limit: usize },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::PathOutsideWorkspace { attempted, root } => write!(
                f,
                "Path '{}' is outside the workspace root {}",
                attempted.display(),
                root.display()
            ),
            DenialReason::UnsafePath { attempted } => write!(
                f,
                "Path {attempted:?} contains control or invisible characters"
            ),
            DenialReason::MutationLimitExceeded { limit } => write!(
                f,
                "Mutating tool call limit reached ({limit} per turn); end the turn and summarize progress"
            ),
            DenialReason::ArgumentsTooLarge { size, limit } => write!(
                f,
                "Tool arguments too large ({size} bytes, limit {limit})"
            ),
        }
    }
}

pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::invalid("arguments", e.to_string()))
}

/// Check `args` against a JSON schema.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| ToolError::invalid("arguments", format!("Invalid tool schema: {e}")))?;
    if let Err(err) = validator.validate(args) {
        return Err(ToolError::invalid("arguments", err.to_string()));
    }
    Ok(())
}

/// Truncate tool output to the effective maximum length.
#[must_use]
pub fn truncate_output(output: String, effective_max: usize) -> String {
    if output.len() <= effective_max {
        return output;
    }
    let marker = "\n\n... [output truncated]";
    if effective_max <= marker.len() {
        return marker[..effective_max].to_string();
    }
    let max_body = effective_max - marker.len();
    let mut end = max_body;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = output;
    truncated.truncate(end);
    truncated.push_str(marker);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_output_keeps_short_text() {
        assert_eq!(truncate_output("short".to_string(), 100), "short");
    }

    #[test]
    fn truncate_output_respects_char_boundaries() {
        let text = "é".repeat(100);
        let out = truncate_output(text, 40);
        assert!(out.len() <= 40);
        assert!(out.ends_with("[output truncated]"));
    }

    #[test]
    fn validate_args_reports_schema_failures() {
        let schema = json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        });
        assert!(validate_args(&schema, &json!({ "path": "a" })).is_ok());
        let err = validate_args(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { ref field, .. } if field == "arguments"));
    }

    #[test]
    fn mutation_limit_message_names_the_limit() {
        let msg = ToolError::PolicyViolation(DenialReason::MutationLimitExceeded { limit: 20 })
            .to_string();
        assert!(msg.contains("20 per turn"));
    }

    #[test]
    fn rejection_classification() {
        assert!(ToolError::UnknownTool { name: "x".into() }.is_rejection());
        assert!(ToolError::invalid("path", "is required").is_rejection());
        let stale = tether_edit::LineReference::capture(&["a"], 1)
            .map(|reference| tether_edit::resolve(&["b"], &reference).unwrap_err())
            .unwrap();
        assert!(!ToolError::Edit(stale).is_rejection());
    }
}
