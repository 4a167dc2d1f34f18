//! Manifest description documents.
//!
//! Empty collections are left out when serialising; a description of an
//! empty stage has no `options` or `inputs` key at all.

use manifold_core::pipeline::Origin;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A whole manifest: sources plus an ordered list of pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDescription {
    pub version: String,
    #[serde(default)]
    pub pipelines: Vec<PipelineDescription>,
    /// Source type name -> source.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, SourceDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescription {
    pub name: String,
    /// Reference to the pipeline providing the build environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Runner for pipelines that use this one as their build environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescription {
    #[serde(rename = "type")]
    pub stage_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, InputDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescription {
    #[serde(rename = "type")]
    pub input_type: String,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "References::is_empty")]
    pub references: References,
}

/// Input references, written either as a list or as a map of
/// reference -> per-reference options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum References {
    List(Vec<String>),
    Map(Map<String, Value>),
}

impl References {
    pub fn is_empty(&self) -> bool {
        match self {
            References::List(refs) => refs.is_empty(),
            References::Map(refs) => refs.is_empty(),
        }
    }

    /// The map form; list entries get empty options.
    pub fn normalize(&self) -> Map<String, Value> {
        match self {
            References::List(refs) => refs
                .iter()
                .map(|r| (r.clone(), Value::Object(Map::new())))
                .collect(),
            References::Map(refs) => refs.clone(),
        }
    }
}

impl Default for References {
    fn default() -> Self {
        References::Map(Map::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescription {
    #[serde(default)]
    pub items: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}
