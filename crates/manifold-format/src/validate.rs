//! Validation of raw manifest documents.

use manifold_core::registry::{Category, ModuleRegistry};
use manifold_core::validation::{PathSegment, ValidationError, ValidationResult};
use serde_json::Value;
use tracing::debug;

use crate::VERSION;

/// Validate a raw manifest document.
///
/// The whole document is checked against the manifest schema, then every
/// source, stage and input against the schema for its type. All problems
/// are collected in one result, each tagged with where it was found.
pub fn validate(manifest: &Value, registry: &dyn ModuleRegistry) -> ValidationResult {
    let mut result = registry
        .schema(Category::Manifest, None, VERSION)
        .validate(manifest);

    if let Some(sources) = manifest.get("sources").and_then(Value::as_object) {
        for (name, source) in sources {
            let res = registry
                .schema(Category::Source, Some(name.as_str()), VERSION)
                .validate(source);
            result.merge(res, &["sources".into(), name.as_str().into()]);
        }
    }

    if let Some(pipelines) = manifest.get("pipelines").and_then(Value::as_array) {
        for (i, pipeline) in pipelines.iter().enumerate() {
            let path: Vec<PathSegment> = vec!["pipelines".into(), i.into()];
            validate_pipeline(pipeline, registry, &path, &mut result);
        }
    }

    debug!(errors = result.errors().len(), "Validated manifest");
    result
}

fn validate_pipeline(
    pipeline: &Value,
    registry: &dyn ModuleRegistry,
    path: &[PathSegment],
    result: &mut ValidationResult,
) {
    let Some(stages) = pipeline.get("stages").and_then(Value::as_array) else {
        return;
    };

    for (i, stage) in stages.iter().enumerate() {
        let path = extend(path, ["stages".into(), i.into()]);
        validate_stage(stage, registry, &path, result);
    }
}

fn validate_stage(
    stage: &Value,
    registry: &dyn ModuleRegistry,
    path: &[PathSegment],
    result: &mut ValidationResult,
) {
    let Some(stage_type) = type_name(stage, path, result) else {
        return;
    };
    let res = registry
        .schema(Category::Stage, Some(stage_type), VERSION)
        .validate(stage);
    result.merge(res, path);

    let Some(inputs) = stage.get("inputs").and_then(Value::as_object) else {
        return;
    };
    for (name, input) in inputs {
        let path = extend(path, ["inputs".into(), name.as_str().into()]);
        let Some(input_type) = type_name(input, &path, result) else {
            continue;
        };
        let res = registry
            .schema(Category::Input, Some(input_type), VERSION)
            .validate(input);
        result.merge(res, &path);
    }
}

/// The `type` of a stage or input; reports an error at `path` if missing.
fn type_name<'a>(
    document: &'a Value,
    path: &[PathSegment],
    result: &mut ValidationResult,
) -> Option<&'a str> {
    let name = document.get("type").and_then(Value::as_str);
    if name.is_none() {
        result.add(ValidationError {
            message: "'type' is missing or not a string".to_string(),
            path: path.to_vec(),
        });
    }
    name
}

fn extend<const N: usize>(path: &[PathSegment], tail: [PathSegment; N]) -> Vec<PathSegment> {
    let mut full = path.to_vec();
    full.extend(tail);
    full
}
