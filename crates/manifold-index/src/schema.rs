//! Compiled JSON schemas.

use jsonschema::Validator;
use jsonschema::paths::{Location, LocationSegment};
use manifold_core::registry::{Category, ModuleInfo, Schema};
use manifold_core::validation::{PathSegment, ValidationError, ValidationResult};
use serde_json::{Value, json};

enum Compiled {
    Ready(Validator),
    Invalid(String),
    Missing,
}

/// A schema for one manifest, stage, input or source type.
///
/// Compilation and lookup failures are not errors: they surface as
/// validation errors whenever the schema is used.
pub struct JsonSchema {
    name: String,
    compiled: Compiled,
}

impl JsonSchema {
    /// Compile `schema` for the document kind called `name`.
    pub fn compile(name: impl Into<String>, schema: &Value) -> Self {
        let compiled = match jsonschema::validator_for(schema) {
            Ok(validator) => Compiled::Ready(validator),
            Err(e) => Compiled::Invalid(e.to_string()),
        };
        Self {
            name: name.into(),
            compiled,
        }
    }

    /// A schema standing in for one the registry does not have.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compiled: Compiled::Missing,
        }
    }
}

impl Schema for JsonSchema {
    fn validate(&self, document: &Value) -> ValidationResult {
        let mut result = ValidationResult::new(Some(self.name.clone()));

        match &self.compiled {
            Compiled::Ready(validator) => {
                for error in validator.iter_errors(document) {
                    result.add(ValidationError {
                        message: error.to_string(),
                        path: path_segments(error.instance_path()),
                    });
                }
            }
            Compiled::Invalid(message) => {
                result.fail(format!("schema for {} is invalid: {}", self.name, message));
            }
            Compiled::Missing => {
                result.fail(format!(
                    "could not find schema information for {}",
                    self.name
                ));
            }
        }

        result
    }
}

/// Convert a JSON pointer location into path segments.
fn path_segments(location: &Location) -> Vec<PathSegment> {
    location
        .iter()
        .map(|segment| match segment {
            LocationSegment::Property(key) => PathSegment::Key(key.into_owned()),
            LocationSegment::Index(idx) => PathSegment::Index(idx),
        })
        .collect()
}

/// Build the full document schema for a module.
///
/// The module's `schema_2` fragment overrides the default schema of each
/// property it names, e.g. `{"options": {...}}` for a stage.
pub fn module_schema(info: &ModuleInfo) -> Value {
    let (mut properties, required) = match info.category {
        Category::Stage => (
            json!({
                "type": { "enum": [info.name] },
                "id": { "type": "string" },
                "options": { "type": "object" },
                "inputs": { "type": "object" },
            }),
            json!(["type"]),
        ),
        Category::Input => (
            json!({
                "type": { "enum": [info.name] },
                "origin": { "type": "string" },
                "options": { "type": "object" },
                "references": {
                    "anyOf": [
                        { "type": "array", "items": { "type": "string" } },
                        { "type": "object" },
                    ]
                },
            }),
            json!(["type", "origin"]),
        ),
        Category::Source => (
            json!({
                "items": { "type": "object" },
                "options": { "type": "object" },
            }),
            json!([]),
        ),
        Category::Manifest => (json!({}), json!([])),
    };

    if let (Some(props), Some(fragment)) = (
        properties.as_object_mut(),
        info.schema_2.as_ref().and_then(Value::as_object),
    ) {
        for (key, value) in fragment {
            props.insert(key.clone(), value.clone());
        }
    }

    json!({
        "title": format!("{} {}", info.category, info.name),
        "type": "object",
        "additionalProperties": false,
        "required": required,
        "properties": properties,
    })
}
