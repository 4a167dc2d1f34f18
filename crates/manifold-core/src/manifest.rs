//! The runnable manifest graph.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::registry::ModuleInfo;
use crate::{Error, ObjectId, Result};

/// An externally fetched artifact declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Source module metadata.
    pub info: Arc<ModuleInfo>,
    pub items: Map<String, Value>,
    pub options: Map<String, Value>,
}

/// Sources plus an ordered set of uniquely named pipelines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pipelines: Vec<Pipeline>,
    sources: Vec<Source>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source. There is at most one source per type; a later source
    /// of the same type replaces the earlier one.
    pub fn add_source(
        &mut self,
        info: Arc<ModuleInfo>,
        items: Map<String, Value>,
        options: Map<String, Value>,
    ) -> &mut Source {
        let source = Source {
            info,
            items,
            options,
        };

        let idx = match self
            .sources
            .iter()
            .position(|s| s.info.name == source.info.name)
        {
            Some(idx) => {
                self.sources[idx] = source;
                idx
            }
            None => {
                self.sources.push(source);
                self.sources.len() - 1
            }
        };
        &mut self.sources[idx]
    }

    /// Add a pipeline. Fails if a pipeline with the same name exists.
    pub fn add_pipeline(
        &mut self,
        name: impl Into<String>,
        runner: Option<String>,
        build: Option<ObjectId>,
    ) -> Result<&mut Pipeline> {
        let name = name.into();
        if self.by_name(&name).is_some() {
            return Err(Error::Conflict(format!(
                "pipeline '{}' already exists",
                name
            )));
        }

        self.pipelines.push(Pipeline::new(name, runner, build));
        let idx = self.pipelines.len() - 1;
        Ok(&mut self.pipelines[idx])
    }

    /// Pipelines in insertion order.
    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipelines_mut(&mut self) -> &mut [Pipeline] {
        &mut self.pipelines
    }

    /// Sources in insertion order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut Pipeline> {
        self.pipelines.iter_mut().find(|p| &p.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }
}
