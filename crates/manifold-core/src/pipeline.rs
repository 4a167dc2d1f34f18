//! Pipeline, stage and input definitions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

use crate::ObjectId;
use crate::registry::ModuleInfo;

/// Where the data for an input comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The tree produced by another pipeline.
    Pipeline,
    /// Items fetched by a source.
    Source,
    /// Any other origin, passed through untouched.
    Other(String),
}

impl Origin {
    pub const PIPELINE: &'static str = "org.osbuild.pipeline";
    pub const SOURCE: &'static str = "org.osbuild.source";

    pub fn as_str(&self) -> &str {
        match self {
            Origin::Pipeline => Self::PIPELINE,
            Origin::Source => Self::SOURCE,
            Origin::Other(name) => name,
        }
    }
}

impl From<&str> for Origin {
    fn from(s: &str) -> Self {
        match s {
            Origin::PIPELINE => Origin::Pipeline,
            Origin::SOURCE => Origin::Source,
            other => Origin::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Origin::from(s.as_str()))
    }
}

/// A named data dependency of a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    /// Name the stage knows this input by (e.g., "tree").
    pub name: String,
    /// Input module metadata.
    pub info: Arc<ModuleInfo>,
    pub origin: Origin,
    pub options: Map<String, Value>,
    /// Reference -> per-reference options. For pipeline origins the keys
    /// are pipeline ids.
    pub references: Map<String, Value>,
}

impl Input {
    pub fn add_reference(&mut self, reference: impl Into<String>, options: Value) {
        self.references.insert(reference.into(), options);
    }
}

/// One unit of work in a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: ObjectId,
    /// Stage module metadata.
    pub info: Arc<ModuleInfo>,
    pub options: Map<String, Value>,
    /// Named inputs, in the order they were added.
    pub inputs: Vec<Input>,
}

impl Stage {
    /// Add an input, replacing any existing input with the same name.
    pub fn add_input(
        &mut self,
        name: impl Into<String>,
        info: Arc<ModuleInfo>,
        origin: Origin,
        options: Map<String, Value>,
    ) -> &mut Input {
        let input = Input {
            name: name.into(),
            info,
            origin,
            options,
            references: Map::new(),
        };

        let idx = match self.inputs.iter().position(|i| i.name == input.name) {
            Some(idx) => {
                self.inputs[idx] = input;
                idx
            }
            None => {
                self.inputs.push(input);
                self.inputs.len() - 1
            }
        };
        &mut self.inputs[idx]
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

/// An ordered sequence of stages, optionally built inside the tree of
/// another pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub id: ObjectId,
    /// Pipeline name, unique within a manifest.
    pub name: String,
    /// Pipeline whose tree is the build environment for this one.
    pub build: Option<ObjectId>,
    /// Runner that interprets this pipeline's stages.
    pub runner: Option<String>,
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, runner: Option<String>, build: Option<ObjectId>) -> Self {
        let name = name.into();
        Self {
            id: ObjectId::for_pipeline(&name),
            name,
            build,
            runner,
            stages: Vec::new(),
        }
    }

    /// Append a stage. Its id is chained onto the previous stage's id.
    ///
    /// The id covers the stage as added. Call [`Pipeline::update_ids`] once
    /// inputs are attached or `build` changes.
    pub fn add_stage(&mut self, info: Arc<ModuleInfo>, options: Map<String, Value>) -> &mut Stage {
        let base = self.stages.last().map(|s| s.id);
        let id = ObjectId::for_stage(base.as_ref(), &self.stage_content(&info, &options, &[]));
        self.stages.push(Stage {
            id,
            info,
            options,
            inputs: Vec::new(),
        });
        let idx = self.stages.len() - 1;
        &mut self.stages[idx]
    }

    /// Recompute every stage id from the current content, in order.
    pub fn update_ids(&mut self) {
        let mut base: Option<ObjectId> = None;
        for idx in 0..self.stages.len() {
            let stage = &self.stages[idx];
            let content = self.stage_content(&stage.info, &stage.options, &stage.inputs);
            let id = ObjectId::for_stage(base.as_ref(), &content);
            self.stages[idx].id = id;
            base = Some(id);
        }
    }

    fn stage_content(
        &self,
        info: &ModuleInfo,
        options: &Map<String, Value>,
        inputs: &[Input],
    ) -> Value {
        let inputs: Map<String, Value> = inputs
            .iter()
            .map(|input| {
                let content = json!({
                    "type": input.info.name,
                    "origin": input.origin.as_str(),
                    "options": input.options,
                    "references": input.references,
                });
                (input.name.clone(), content)
            })
            .collect();

        json!({
            "pipeline": self.id.to_string(),
            "build": self.build.map(|b| b.to_string()),
            "type": info.name,
            "options": options,
            "inputs": inputs,
        })
    }
}
