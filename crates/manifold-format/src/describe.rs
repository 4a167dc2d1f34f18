//! Describing a manifest as a version 2 description.

use manifold_core::pipeline::{Input, Origin, Pipeline, Stage};
use manifold_core::{Manifest, ObjectId};
use serde_json::Map;
use std::collections::HashMap;
use tracing::warn;

use crate::description::{
    InputDescription, ManifestDescription, PipelineDescription, References, SourceDescription,
    StageDescription,
};
use crate::{VERSION, reference, runners};

/// Describe `manifest`.
///
/// References are symbolic (`name:<pipeline>`) unless `with_id` is set, in
/// which case raw ids are written and every stage carries its `id`.
pub fn describe(manifest: &Manifest, with_id: bool) -> ManifestDescription {
    let describer = Describer {
        manifest,
        with_id,
        runners: runners::build_runners(manifest),
    };

    ManifestDescription {
        version: VERSION.to_string(),
        pipelines: manifest
            .pipelines()
            .iter()
            .map(|p| describer.pipeline(p))
            .collect(),
        sources: manifest
            .sources()
            .iter()
            .map(|s| {
                (
                    s.info.name.clone(),
                    SourceDescription {
                        items: s.items.clone(),
                        options: s.options.clone(),
                    },
                )
            })
            .collect(),
    }
}

struct Describer<'a> {
    manifest: &'a Manifest,
    with_id: bool,
    runners: HashMap<ObjectId, String>,
}

impl Describer<'_> {
    fn pipeline(&self, pipeline: &Pipeline) -> PipelineDescription {
        PipelineDescription {
            name: pipeline.name.clone(),
            build: pipeline.build.map(|id| self.reference(&id)),
            runner: self
                .runners
                .get(&pipeline.id)
                .filter(|r| !r.is_empty())
                .cloned(),
            stages: pipeline.stages.iter().map(|s| self.stage(s)).collect(),
        }
    }

    fn stage(&self, stage: &Stage) -> StageDescription {
        StageDescription {
            stage_type: stage.info.name.clone(),
            id: self.with_id.then(|| stage.id.to_string()),
            options: stage.options.clone(),
            inputs: stage
                .inputs
                .iter()
                .map(|i| (i.name.clone(), self.input(i)))
                .collect(),
        }
    }

    fn input(&self, input: &Input) -> InputDescription {
        let mut references = Map::new();
        for (key, options) in &input.references {
            let key = match input.origin {
                Origin::Pipeline => match key.parse::<ObjectId>() {
                    Ok(id) => self.reference(&id),
                    Err(e) => {
                        warn!(
                            input = %input.name,
                            error = %e,
                            "Pipeline input with a non-id reference"
                        );
                        key.clone()
                    }
                },
                _ => key.clone(),
            };
            references.insert(key, options.clone());
        }

        InputDescription {
            input_type: input.info.name.clone(),
            origin: input.origin.clone(),
            options: input.options.clone(),
            references: References::Map(references),
        }
    }

    fn reference(&self, id: &ObjectId) -> String {
        reference::render(self.manifest, id, self.with_id)
    }
}
