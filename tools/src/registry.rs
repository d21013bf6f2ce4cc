//! Static catalog of tool schemas.
//!
//! The catalog is built once on first use and never mutated. Its order is the
//! order of [`ToolKind::ALL`], which is also the order definitions are sent to
//! the model in.

use std::sync::LazyLock;

use serde_json::{Map, Value, json};
use tether_types::ToolDefinition;

use crate::ToolError;
use crate::kind::{ToolKind, ToolName};

static REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(ToolRegistry::build);

/// One catalog entry: the tool and its wire definition.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    kind: ToolKind,
    definition: ToolDefinition,
}

impl ToolSchema {
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.definition.description
    }

    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.definition.parameters
    }

    #[must_use]
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    #[must_use]
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.definition.parameters.get("properties")?.as_object()
    }

    /// Names of the required top-level parameters. Empty for tools without any.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.definition
            .parameters
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

#[derive(Debug)]
pub struct ToolRegistry {
    schemas: Vec<ToolSchema>,
}

impl ToolRegistry {
    /// The process-wide catalog.
    #[must_use]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    fn build() -> Self {
        let schemas = ToolKind::ALL
            .into_iter()
            .map(|kind| ToolSchema {
                kind,
                definition: definition_for(kind),
            })
            .collect();
        Self { schemas }
    }

    #[must_use]
    pub fn get(&self, kind: ToolKind) -> &ToolSchema {
        &self.schemas[kind.index()]
    }

    /// Look up a schema by the name the agent used.
    pub fn lookup(&self, name: &str) -> Result<&ToolSchema, ToolError> {
        match ToolName::parse(name) {
            ToolName::Known(kind) => Ok(self.get(kind)),
            ToolName::Unknown(name) => Err(ToolError::UnknownTool { name }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSchema> {
        self.schemas.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Function-calling envelopes for every tool, as sent to the model.
    #[must_use]
    pub fn function_tools(&self) -> Value {
        Value::Array(
            self.schemas
                .iter()
                .map(|schema| json!(schema.definition.as_function()))
                .collect(),
        )
    }
}

/// Definitions of every tool, in catalog order.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    ToolRegistry::global()
        .iter()
        .map(|schema| schema.definition.clone())
        .collect()
}

fn definition_for(kind: ToolKind) -> ToolDefinition {
    let (description, parameters) = match kind {
        ToolKind::ReadFile => (
            "Read a text file from the workspace. Each line is prefixed with an anchor \
             '<line>:<hash>|'; pass these anchors as 'ref' to edit_file.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace root" },
                    "start_line": { "type": "integer", "minimum": 1, "description": "First line to show (1-indexed, inclusive)" },
                    "end_line": { "type": "integer", "minimum": 1, "description": "Last line to show (1-indexed, inclusive)" }
                },
                "required": ["path"]
            }),
        ),
        ToolKind::ListDir => (
            "List the entries of a workspace directory.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Directory path, relative to the workspace root" },
                    "recursive": { "type": "boolean", "description": "List subdirectories recursively" }
                },
                "required": ["path"]
            }),
        ),
        ToolKind::SearchFiles => (
            "Search file contents in the workspace with a regular expression.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": { "type": "string", "description": "Regular expression to search for" },
                    "path": { "type": "string", "description": "Directory or file to search (default: workspace root)" },
                    "glob": { "type": "string", "description": "Only search files matching this glob, e.g. '*.rs'" }
                },
                "required": ["pattern"]
            }),
        ),
        ToolKind::WebSearch => (
            "Search the web and return result titles, URLs and snippets.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "max_results": { "type": "integer", "minimum": 1, "description": "Maximum number of results" }
                },
                "required": ["query"]
            }),
        ),
        ToolKind::Exec => (
            "Run a shell command in the workspace and return its stdout and stderr.",
            json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string", "description": "Shell command to run" },
                    "workdir": { "type": "string", "description": "Working directory (default: workspace root)" },
                    "timeout_secs": { "type": "integer", "minimum": 1, "description": "Timeout in seconds" }
                },
                "required": ["command"]
            }),
        ),
        ToolKind::WriteFile => (
            "Create a file or replace its entire content. Prefer edit_file for changes to existing files.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace root" },
                    "content": { "type": "string", "description": "Complete new file content" }
                },
                "required": ["path", "content"]
            }),
        ),
        ToolKind::EditFile => (
            "Edit lines of an existing file. Each edit targets a line by the '<line>:<hash>' anchor \
             from your last read_file. All anchors in one call refer to that same read. If an anchor \
             is stale the whole call fails; re-read the file and retry.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace root" },
                    "edits": {
                        "type": "array",
                        "description": "Line edits, applied atomically",
                        "items": {
                            "type": "object",
                            "properties": {
                                "op": {
                                    "type": "string",
                                    "enum": ["replace_line", "insert_after", "insert_before", "delete_line"],
                                    "description": "Edit operation"
                                },
                                "ref": { "type": "string", "description": "Line anchor '<line>:<hash>'" },
                                "content": { "type": "string", "description": "New text; may span several lines. Required except for delete_line" }
                            },
                            "required": ["op", "ref"]
                        }
                    }
                },
                "required": ["path", "edits"]
            }),
        ),
        ToolKind::UndoEdit => (
            "Revert the most recent write_file or edit_file on a file.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace root" }
                },
                "required": ["path"]
            }),
        ),
        ToolKind::ReadSymbols => (
            "List the functions and types defined in a source file.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File path, relative to the workspace root" },
                    "kind": {
                        "type": "string",
                        "enum": ["function", "type", "all"],
                        "description": "Which symbols to list (default: all)"
                    }
                },
                "required": ["path"]
            }),
        ),
        ToolKind::GitStatus => (
            "Show working tree status.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        ToolKind::GitDiff => (
            "Show changes in the working tree or index.",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Limit the diff to this path" },
                    "staged": { "type": "boolean", "description": "Show staged changes instead of unstaged" }
                },
                "required": []
            }),
        ),
        ToolKind::GitCommit => (
            "Commit changes to the workspace repository.",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Commit message" },
                    "paths": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Paths to stage before committing (default: all changes)"
                    }
                },
                "required": ["message"]
            }),
        ),
        ToolKind::SaveMemory => (
            "Store a note that persists across turns.",
            json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string", "description": "Name of the note" },
                    "content": { "type": "string", "description": "Note content" }
                },
                "required": ["key", "content"]
            }),
        ),
        ToolKind::CoderUpdateState => (
            "Report progress on the current task.",
            json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["planning", "coding", "testing", "reviewing", "done"],
                        "description": "Current phase"
                    },
                    "summary": { "type": "string", "description": "What has been done so far" },
                    "next_steps": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Planned next steps"
                    }
                },
                "required": []
            }),
        ),
    };
    ToolDefinition::new(kind.name(), description, parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn required(kind: ToolKind) -> Vec<&'static str> {
        ToolRegistry::global().get(kind).required().collect()
    }

    #[test]
    fn catalog_has_fourteen_unique_tools() {
        let registry = ToolRegistry::global();
        assert_eq!(registry.len(), 14);
        let names: HashSet<_> = registry.iter().map(ToolSchema::name).collect();
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn catalog_order_matches_tool_kinds() {
        let names: Vec<_> = definitions().into_iter().map(|d| d.name).collect();
        let expected: Vec<_> = ToolKind::ALL.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn tools_without_mandatory_arguments_declare_empty_required() {
        for kind in [ToolKind::GitStatus, ToolKind::CoderUpdateState] {
            let schema = ToolRegistry::global().get(kind);
            assert_eq!(schema.parameters()["required"], json!([]));
        }
    }

    #[test]
    fn required_sets() {
        assert_eq!(required(ToolKind::EditFile), vec!["path", "edits"]);
        assert_eq!(required(ToolKind::WriteFile), vec!["path", "content"]);
        assert_eq!(required(ToolKind::GitCommit), vec!["message"]);
        assert_eq!(required(ToolKind::SaveMemory), vec!["key", "content"]);
        assert!(required(ToolKind::GitDiff).is_empty());
    }

    #[test]
    fn edit_items_enumerate_the_four_operations() {
        let schema = ToolRegistry::global().get(ToolKind::EditFile);
        let items = &schema.parameters()["properties"]["edits"]["items"];
        assert_eq!(
            items["properties"]["op"]["enum"],
            json!(["replace_line", "insert_after", "insert_before", "delete_line"])
        );
        assert_eq!(items["required"], json!(["op", "ref"]));
    }

    #[test]
    fn every_schema_is_a_valid_json_schema() {
        for schema in ToolRegistry::global().iter() {
            assert!(
                jsonschema::validator_for(schema.parameters()).is_ok(),
                "{}",
                schema.name()
            );
        }
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        let err = ToolRegistry::global().lookup("delete_repo").unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { name } if name == "delete_repo"));
    }

    #[test]
    fn function_envelope_shape() {
        let tools = ToolRegistry::global().function_tools();
        let first = &tools[0];
        assert_eq!(first["type"], "function");
        assert_eq!(first["function"]["name"], "read_file");
        assert_eq!(first["function"]["parameters"]["type"], "object");
    }
}
