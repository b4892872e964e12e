//! Derive tool input schemas from Rust types.
//!
//! Schemas come from `schemars` derives, so the shape is fixed at compile time.
//! The generated schema is normalized into the form the model is sent: an inlined
//! object schema with no references and no tolerance for undeclared properties.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::errors::StartupError;

/// Generate the input schema for `T`.
///
/// Fails when `T` does not describe an object, or when any part of the schema
/// could not be inlined.
pub fn generate_schema<T: JsonSchema>() -> Result<Value, StartupError> {
    let type_name = T::schema_name();
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();

    let mut schema = serde_json::to_value(&root).map_err(|e| StartupError::Schema {
        type_name: type_name.clone(),
        reason: e.to_string(),
    })?;

    let object = schema.as_object_mut().ok_or_else(|| StartupError::Schema {
        type_name: type_name.clone(),
        reason: "schema is not a json object".to_string(),
    })?;
    object.remove("$schema");
    object.remove("title");
    object.remove("definitions");

    if !is_object_schema(object) {
        return Err(StartupError::Schema {
            type_name,
            reason: "tool input must be an object with named fields".to_string(),
        });
    }
    object
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));

    normalize(&mut schema).map_err(|reason| StartupError::Schema { type_name, reason })?;
    Ok(schema)
}

fn is_object_schema(node: &Map<String, Value>) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}

// Close every object schema and reject anything left as a reference.
fn normalize(value: &mut Value) -> Result<(), String> {
    match value {
        Value::Object(node) => {
            if let Some(Value::String(reference)) = node.get("$ref") {
                return Err(format!("unresolved reference {}", reference));
            }
            if is_object_schema(node) {
                node.entry("additionalProperties")
                    .or_insert(Value::Bool(false));
            }
            for child in node.values_mut() {
                normalize(child)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter_mut().try_for_each(normalize),
        _ => Ok(()),
    }
}
