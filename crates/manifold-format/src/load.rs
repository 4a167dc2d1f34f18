//! Loading descriptions into a manifest.
//!
//! Loading runs in three passes:
//! 1. every pipeline is registered, so references may point forward;
//! 2. build references, stages and inputs are resolved and attached;
//! 3. runners are propagated from build pipelines to their consumers.

use manifold_core::pipeline::{Input, Origin, Pipeline};
use manifold_core::registry::{Category, ModuleRegistry};
use manifold_core::{Error, Manifest, ObjectId, RunnerResolver};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::description::{InputDescription, ManifestDescription, PipelineDescription};
use crate::{FormatError, FormatResult, VERSION, reference, runners};

/// Load a raw JSON description.
pub fn load_value(
    raw: &Value,
    registry: &dyn ModuleRegistry,
    host: &dyn RunnerResolver,
) -> FormatResult<Manifest> {
    let description: ManifestDescription = serde_json::from_value(raw.clone())?;
    load(&description, registry, host)
}

/// Load a description into a manifest.
///
/// The description is expected to have passed [`crate::validate`].
pub fn load(
    description: &ManifestDescription,
    registry: &dyn ModuleRegistry,
    host: &dyn RunnerResolver,
) -> FormatResult<Manifest> {
    if description.version != VERSION {
        return Err(FormatError::UnsupportedVersion(description.version.clone()));
    }

    debug!(
        pipelines = description.pipelines.len(),
        sources = description.sources.len(),
        "Loading manifest"
    );

    let mut manifest = Manifest::new();

    for (name, desc) in &description.sources {
        let info = registry.module_info(Category::Source, name)?;
        manifest.add_source(info, desc.items.clone(), desc.options.clone());
    }

    let declared = register_pipelines(&mut manifest, &description.pipelines)?;

    for desc in &description.pipelines {
        load_pipeline(&mut manifest, desc, registry)?;
    }

    if let Err(cycle) = detect_cycle(&manifest) {
        return Err(FormatError::CycleDetected(cycle));
    }

    runners::propagate(&mut manifest, &declared, host)?;

    Ok(manifest)
}

/// Add an empty pipeline for every description and collect their declared
/// runners.
fn register_pipelines(
    manifest: &mut Manifest,
    pipelines: &[PipelineDescription],
) -> FormatResult<HashMap<ObjectId, Option<String>>> {
    let mut declared = HashMap::new();

    for desc in pipelines {
        if manifest.by_name(&desc.name).is_some() {
            return Err(FormatError::AmbiguousReference(desc.name.clone()));
        }
        let pipeline = manifest.add_pipeline(&desc.name, None, None)?;
        declared.insert(pipeline.id, desc.runner.clone());
    }

    Ok(declared)
}

fn load_pipeline(
    manifest: &mut Manifest,
    desc: &PipelineDescription,
    registry: &dyn ModuleRegistry,
) -> FormatResult<()> {
    let id = ObjectId::for_pipeline(&desc.name);
    let build = desc
        .build
        .as_deref()
        .map(|r| reference::resolve(manifest, r))
        .transpose()?;
    pipeline_mut(manifest, &id)?.build = build;

    for stage_desc in &desc.stages {
        let info = registry.module_info(Category::Stage, &stage_desc.stage_type)?;

        let mut inputs = Vec::with_capacity(stage_desc.inputs.len());
        for (name, input_desc) in &stage_desc.inputs {
            inputs.push(load_input(manifest, name, input_desc, registry)?);
        }

        let stage = pipeline_mut(manifest, &id)?.add_stage(info, stage_desc.options.clone());
        for input in inputs {
            let Input {
                name,
                info,
                origin,
                options,
                references,
            } = input;
            let added = stage.add_input(name, info, origin, options);
            for (reference, options) in references {
                added.add_reference(reference, options);
            }
        }
    }

    pipeline_mut(manifest, &id)?.update_ids();

    debug!(pipeline = %desc.name, stages = desc.stages.len(), "Loaded pipeline");
    Ok(())
}

/// Build an input with its references normalized and, for pipeline
/// origins, resolved to pipeline ids.
fn load_input(
    manifest: &Manifest,
    name: &str,
    desc: &InputDescription,
    registry: &dyn ModuleRegistry,
) -> FormatResult<Input> {
    let info = registry.module_info(Category::Input, &desc.input_type)?;

    let mut references = Map::new();
    for (reference, options) in desc.references.normalize() {
        let key = match desc.origin {
            Origin::Pipeline => reference::resolve(manifest, &reference)?.to_string(),
            _ => reference,
        };
        references.insert(key, options);
    }

    Ok(Input {
        name: name.to_string(),
        info,
        origin: desc.origin.clone(),
        options: desc.options.clone(),
        references,
    })
}

fn pipeline_mut<'a>(manifest: &'a mut Manifest, id: &ObjectId) -> FormatResult<&'a mut Pipeline> {
    manifest
        .get_mut(id)
        .ok_or_else(|| FormatError::Core(Error::NotFound(format!("pipeline {}", id))))
}

/// Find a pipeline that is, directly or transitively, its own build
/// pipeline. Returns the offending chain of names.
fn detect_cycle(manifest: &Manifest) -> Result<(), String> {
    let mut checked: HashSet<ObjectId> = HashSet::new();

    for pipeline in manifest.pipelines() {
        let mut chain = Vec::new();
        let mut on_chain = HashSet::new();
        let mut current = Some(pipeline);

        while let Some(p) = current {
            if checked.contains(&p.id) {
                break;
            }
            chain.push(p.name.as_str());
            if !on_chain.insert(p.id) {
                return Err(chain.join(" -> "));
            }
            current = p.build.and_then(|b| manifest.get(&b));
        }

        checked.extend(on_chain);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::registry;
    use manifold_core::FixedRunner;
    use serde_json::json;

    fn host() -> FixedRunner {
        FixedRunner("org.osbuild.host".into())
    }

    fn load_json(raw: Value) -> FormatResult<Manifest> {
        load_value(&raw, &registry(), &host())
    }

    #[test]
    fn test_load_pipelines_stages_and_sources() {
        let manifest = load_json(json!({
            "version": "2",
            "sources": {
                "org.osbuild.curl": {
                    "items": { "sha256:aa": "https://example.com/a.rpm" }
                }
            },
            "pipelines": [
                {
                    "name": "build",
                    "runner": "org.osbuild.fedora38",
                    "stages": [
                        { "type": "org.osbuild.mkdir", "options": { "paths": ["/a"] } },
                        { "type": "org.osbuild.noop" }
                    ]
                },
                { "name": "os", "build": "name:build" }
            ]
        }))
        .unwrap();

        assert_eq!(manifest.sources().len(), 1);
        assert_eq!(manifest.sources()[0].info.name, "org.osbuild.curl");

        let build = manifest.by_name("build").unwrap();
        assert_eq!(build.stages.len(), 2);
        assert_eq!(build.stages[0].info.name, "org.osbuild.mkdir");
        assert_eq!(build.stages[0].options["paths"], json!(["/a"]));

        let os = manifest.by_name("os").unwrap();
        assert_eq!(os.build, Some(build.id));
        assert!(os.stages.is_empty());
    }

    #[test]
    fn test_runner_inversion() {
        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "a" },
                { "name": "b", "build": "name:a", "runner": "r1" }
            ]
        }))
        .unwrap();

        // b declares r1 but nothing is built inside b; a is a root pipeline.
        assert_eq!(
            manifest.by_name("a").unwrap().runner.as_deref(),
            Some("org.osbuild.host")
        );
        assert_eq!(manifest.by_name("b").unwrap().runner, None);

        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "a", "runner": "r1" },
                { "name": "b", "build": "name:a" }
            ]
        }))
        .unwrap();
        assert_eq!(
            manifest.by_name("a").unwrap().runner.as_deref(),
            Some("org.osbuild.host")
        );
        assert_eq!(manifest.by_name("b").unwrap().runner.as_deref(), Some("r1"));
    }

    #[test]
    fn test_pipeline_input_references_resolve_to_ids() {
        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "a" },
                {
                    "name": "b",
                    "stages": [{
                        "type": "org.osbuild.copy",
                        "inputs": {
                            "tree": {
                                "type": "org.osbuild.tree",
                                "origin": "org.osbuild.pipeline",
                                "references": ["name:a"]
                            }
                        }
                    }]
                }
            ]
        }))
        .unwrap();

        let a = manifest.by_name("a").unwrap().id;
        let input = manifest.by_name("b").unwrap().stages[0].input("tree").unwrap();
        assert_eq!(input.origin, Origin::Pipeline);
        let keys: Vec<_> = input.references.keys().cloned().collect();
        assert_eq!(keys, vec![a.to_string()]);
    }

    #[test]
    fn test_source_input_references_pass_through() {
        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [{
                "name": "os",
                "stages": [{
                    "type": "org.osbuild.copy",
                    "inputs": {
                        "files": {
                            "type": "org.osbuild.files",
                            "origin": "org.osbuild.source",
                            "references": { "sha256:aa": { "mode": "0644" } }
                        }
                    }
                }]
            }]
        }))
        .unwrap();

        let input = manifest.by_name("os").unwrap().stages[0].input("files").unwrap();
        assert_eq!(input.references["sha256:aa"], json!({ "mode": "0644" }));
    }

    #[test]
    fn test_other_origins_validate_and_pass_through() {
        let raw = json!({
            "version": "2",
            "pipelines": [{
                "name": "os",
                "stages": [{
                    "type": "org.osbuild.copy",
                    "inputs": {
                        "tree": {
                            "type": "org.osbuild.tree",
                            "origin": "org.example.mirror",
                            "references": ["name:os"]
                        }
                    }
                }]
            }]
        });
        assert!(crate::validate(&raw, &registry()).is_valid());

        let manifest = load_json(raw).unwrap();
        let input = manifest.by_name("os").unwrap().stages[0].input("tree").unwrap();
        assert_eq!(input.origin, Origin::Other("org.example.mirror".into()));
        assert_eq!(input.references["name:os"], json!({}));
    }

    #[test]
    fn test_reference_list_and_map_load_identically() {
        let load_refs = |references: Value| {
            let manifest = load_json(json!({
                "version": "2",
                "pipelines": [{
                    "name": "os",
                    "stages": [{
                        "type": "org.osbuild.copy",
                        "inputs": {
                            "files": {
                                "type": "org.osbuild.files",
                                "origin": "org.osbuild.source",
                                "references": references
                            }
                        }
                    }]
                }]
            }))
            .unwrap();
            manifest.by_name("os").unwrap().stages[0].inputs[0].clone()
        };

        assert_eq!(load_refs(json!(["x"])), load_refs(json!({ "x": {} })));
    }

    #[test]
    fn test_forward_references_are_allowed() {
        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "os", "build": "name:build" },
                { "name": "build", "runner": "org.osbuild.rhel94" }
            ]
        }))
        .unwrap();

        let os = manifest.by_name("os").unwrap();
        assert_eq!(os.build, Some(ObjectId::for_pipeline("build")));
        assert_eq!(os.runner.as_deref(), Some("org.osbuild.rhel94"));
        let names: Vec<_> = manifest.pipelines().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["os", "build"]);
    }

    #[test]
    fn test_raw_id_references() {
        let build = ObjectId::for_pipeline("build").to_string();
        let manifest = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "build" },
                { "name": "os", "build": build }
            ]
        }))
        .unwrap();
        assert_eq!(
            manifest.by_name("os").unwrap().build,
            Some(ObjectId::for_pipeline("build"))
        );
    }

    #[test]
    fn test_unresolved_references() {
        let err = load_json(json!({
            "version": "2",
            "pipelines": [{ "name": "os", "build": "name:missing" }]
        }))
        .unwrap_err();
        assert!(matches!(err, FormatError::UnresolvedReference(r) if r == "name:missing"));

        let err = load_json(json!({
            "version": "2",
            "pipelines": [{
                "name": "os",
                "stages": [{
                    "type": "org.osbuild.copy",
                    "inputs": {
                        "tree": {
                            "type": "org.osbuild.tree",
                            "origin": "org.osbuild.pipeline",
                            "references": ["name:missing"]
                        }
                    }
                }]
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, FormatError::UnresolvedReference(_)));
    }

    #[test]
    fn test_duplicate_pipeline_names_are_ambiguous() {
        let err = load_json(json!({
            "version": "2",
            "pipelines": [{ "name": "os" }, { "name": "os" }]
        }))
        .unwrap_err();
        assert!(matches!(err, FormatError::AmbiguousReference(n) if n == "os"));
    }

    #[test]
    fn test_build_cycles_are_rejected() {
        let err = load_json(json!({
            "version": "2",
            "pipelines": [
                { "name": "a", "build": "name:b" },
                { "name": "b", "build": "name:a" }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, FormatError::CycleDetected(c) if c == "a -> b -> a"));

        let err = load_json(json!({
            "version": "2",
            "pipelines": [{ "name": "self", "build": "name:self" }]
        }))
        .unwrap_err();
        assert!(matches!(err, FormatError::CycleDetected(_)));
    }

    #[test]
    fn test_unknown_module_types() {
        let err = load_json(json!({
            "version": "2",
            "pipelines": [{ "name": "os", "stages": [{ "type": "org.osbuild.nope" }] }]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Core(Error::UnknownModule {
                category: Category::Stage,
                ..
            })
        ));

        let err = load_json(json!({
            "version": "2",
            "sources": { "org.osbuild.nope": { "items": {} } },
            "pipelines": []
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Core(Error::UnknownModule {
                category: Category::Source,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let err = load_json(json!({ "version": "1", "pipelines": [] })).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(v) if v == "1"));
    }

    #[test]
    fn test_stage_ids_are_deterministic() {
        let raw = json!({
            "version": "2",
            "pipelines": [{
                "name": "os",
                "stages": [{ "type": "org.osbuild.noop" }, { "type": "org.osbuild.noop" }]
            }]
        });
        let first = load_json(raw.clone()).unwrap();
        let second = load_json(raw).unwrap();
        assert_eq!(first, second);

        let stages = &first.by_name("os").unwrap().stages;
        assert_ne!(stages[0].id, stages[1].id);
    }

    #[test]
    fn test_stage_ids_differ_by_inputs_and_build() {
        let load_os = |tree: &str, build: Option<&str>| {
            let mut os = json!({
                "name": "os",
                "stages": [{
                    "type": "org.osbuild.copy",
                    "inputs": {
                        "tree": {
                            "type": "org.osbuild.tree",
                            "origin": "org.osbuild.pipeline",
                            "references": [tree]
                        }
                    }
                }]
            });
            if let Some(build) = build {
                os["build"] = json!(build);
            }
            let manifest = load_json(json!({
                "version": "2",
                "pipelines": [{ "name": "a" }, { "name": "b" }, os]
            }))
            .unwrap();
            manifest.by_name("os").unwrap().stages[0].id
        };

        let from_a = load_os("name:a", None);
        assert_eq!(from_a, load_os("name:a", None));
        assert_ne!(from_a, load_os("name:b", None));
        assert_ne!(from_a, load_os("name:a", Some("name:b")));
    }
}
