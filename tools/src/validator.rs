//! Argument validation against the tool catalog.
//!
//! A structural walk over the schema reports the first problem with the field
//! path that caused it (`edits[1].op`). `edit_file` batches are then parsed so
//! malformed references fail here, before any file is read. The full JSON
//! Schema check runs last.

use serde_json::{Map, Value};
use tether_edit::{EditOperation, WireEdit};

use crate::kind::ToolKind;
use crate::registry::ToolRegistry;
use crate::{ToolError, validate_args};

/// A call whose name and arguments passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCall {
    pub kind: ToolKind,
    pub arguments: Value,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolValidator<'r> {
    registry: &'r ToolRegistry,
}

impl Default for ToolValidator<'static> {
    fn default() -> Self {
        Self::new(ToolRegistry::global())
    }
}

impl<'r> ToolValidator<'r> {
    #[must_use]
    pub const fn new(registry: &'r ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, name: &str, arguments: &Value) -> Result<ValidatedCall, ToolError> {
        let schema = self.registry.lookup(name)?;
        check_object(schema.parameters(), arguments, "")?;
        let arguments = without_nulls(arguments);
        if schema.kind() == ToolKind::EditFile {
            edit_operations(&arguments)?;
        }
        validate_args(schema.parameters(), &arguments)?;
        Ok(ValidatedCall {
            kind: schema.kind(),
            arguments,
        })
    }
}

/// Validate a call against the process-wide catalog.
pub fn validate(name: &str, arguments: &Value) -> Result<ValidatedCall, ToolError> {
    ToolValidator::default().validate(name, arguments)
}

/// Parse the `edits` array of already shape-checked `edit_file` arguments.
pub(crate) fn edit_operations(arguments: &Value) -> Result<Vec<EditOperation>, ToolError> {
    let Some(items) = arguments.get("edits").and_then(Value::as_array) else {
        return Err(ToolError::invalid("edits", "is required"));
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let wire: WireEdit = serde_json::from_value(item.clone())
                .map_err(|e| ToolError::invalid(format!("edits[{idx}]"), e.to_string()))?;
            let kind = wire.op;
            EditOperation::try_from(wire).map_err(|err| match err {
                tether_edit::EditError::MissingContent { .. } => ToolError::invalid(
                    format!("edits[{idx}].content"),
                    format!("is required for {kind}"),
                ),
                other => ToolError::Edit(other),
            })
        })
        .collect()
}

/// Copy of `value` with null-valued object members removed at every depth.
///
/// Required fields were already checked to be non-null, so only optional
/// fields the caller spelled out as `null` are dropped.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(name, member)| (name.clone(), without_nulls(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn check_object(schema: &Value, value: &Value, path: &str) -> Result<(), ToolError> {
    let Some(object) = value.as_object() else {
        let field = if path.is_empty() { "arguments" } else { path };
        return Err(ToolError::invalid(field, "must be an object"));
    };
    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        if object.get(name).is_none_or(Value::is_null) {
            return Err(ToolError::invalid(field_path(path, name), "is required"));
        }
    }

    for (name, supplied) in object {
        let field = field_path(path, name);
        let Some(property) = properties.get(name) else {
            return Err(ToolError::invalid(field, "is not a parameter of this tool"));
        };
        // Explicit null on an optional field means "not supplied".
        if !supplied.is_null() {
            check_value(property, supplied, &field)?;
        }
    }
    Ok(())
}

fn check_value(schema: &Value, value: &Value, path: &str) -> Result<(), ToolError> {
    let expected = schema.get("type").and_then(Value::as_str).unwrap_or("");
    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };
    if !matches {
        return Err(ToolError::invalid(path, format!("must be of type {expected}")));
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
        && !allowed.contains(value)
    {
        let names: Vec<&str> = allowed.iter().filter_map(Value::as_str).collect();
        return Err(ToolError::invalid(
            path,
            format!("must be one of: {}", names.join(", ")),
        ));
    }

    if let (Some(minimum), Some(number)) = (
        schema.get("minimum").and_then(Value::as_i64),
        value.as_i64(),
    ) && number < minimum
    {
        return Err(ToolError::invalid(path, format!("must be at least {minimum}")));
    }

    match value {
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (idx, item) in items.iter().enumerate() {
                    check_value(item_schema, item, &format!("{path}[{idx}]"))?;
                }
            }
        }
        Value::Object(_) => check_object(schema, value, path)?,
        _ => {}
    }
    Ok(())
}
