//! Validate tool call input against a tool's declared schema before execution.

use serde_json::{Map, Value};

/// Validate tool input against a JSON schema.
///
/// Checks the schema type, required field presence, property types, and
/// undeclared properties when the schema is closed. Nested objects and array
/// items are checked the same way. Returns a message describing the first
/// violation found.
pub fn validate_input(input: &Value, schema: &Value) -> Result<(), String> {
    validate_at("input", input, schema)
}

fn validate_at(path: &str, value: &Value, schema: &Value) -> Result<(), String> {
    if let Some(expected) = schema.get("type") {
        if !type_matches(value, expected) {
            return Err(format!(
                "{} expected type {}, got {}",
                path,
                describe_type(expected),
                json_type_name(value)
            ));
        }
    }

    if let Some(obj) = value.as_object() {
        validate_object(path, obj, schema)?;
    }

    if let (Some(items), Some(item_schema)) = (value.as_array(), schema.get("items")) {
        for (index, item) in items.iter().enumerate() {
            validate_at(&format!("{}[{}]", path, index), item, item_schema)?;
        }
    }

    Ok(())
}

fn validate_object(path: &str, obj: &Map<String, Value>, schema: &Value) -> Result<(), String> {
    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for name in required.iter().filter_map(|field| field.as_str()) {
            if !obj.contains_key(name) {
                return Err(format!("{} is missing required field '{}'", path, name));
            }
        }
    }

    let properties = schema.get("properties").and_then(|v| v.as_object());
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in obj {
        match properties.and_then(|props| props.get(key)) {
            Some(prop_schema) => validate_at(&format!("{}.{}", path, key), value, prop_schema)?,
            None if closed => {
                return Err(format!("{} has unexpected field '{}'", path, key));
            }
            None => {}
        }
    }

    Ok(())
}

fn type_matches(value: &Value, expected: &Value) -> bool {
    match expected {
        Value::String(name) => value_matches_type(value, name),
        Value::Array(names) => names
            .iter()
            .filter_map(|name| name.as_str())
            .any(|name| value_matches_type(value, name)),
        _ => true,
    }
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::Array(names) => names
            .iter()
            .filter_map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.as_str().unwrap_or("unknown").to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
