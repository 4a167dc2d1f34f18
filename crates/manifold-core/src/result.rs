//! Raw build results, as reported by the execution engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ObjectId;

/// Outcome of running a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildResults {
    /// Overall verdict, decided by the engine.
    pub success: bool,
    /// Per-pipeline outcomes in the order the engine ran them.
    #[serde(default)]
    pub pipelines: Vec<PipelineOutcome>,
}

impl BuildResults {
    pub fn pipeline(&self, id: &ObjectId) -> Option<&PipelineOutcome> {
        self.pipelines.iter().find(|p| &p.id == id)
    }
}

/// Outcome of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub id: ObjectId,
    pub success: bool,
    /// Stages that ran, in order. The engine stops at the first failure.
    #[serde(default)]
    pub stages: Vec<StageOutcome>,
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub id: ObjectId,
    /// Stage type name.
    pub name: String,
    /// Captured output.
    #[serde(default)]
    pub output: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}
