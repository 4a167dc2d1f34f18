//! Core object model and collaborator traits for Manifold build manifests.
//!
//! This crate contains:
//! - Content-derived object identifiers
//! - The runnable manifest graph (manifest, pipelines, stages, inputs, sources)
//! - Module registry and schema traits
//! - Validation results
//! - Host runner detection
//! - Raw per-pipeline build results

pub mod error;
pub mod id;
pub mod manifest;
pub mod pipeline;
pub mod registry;
pub mod result;
pub mod runner;
pub mod validation;

pub use error::{Error, Result};
pub use id::ObjectId;
pub use manifest::{Manifest, Source};
pub use pipeline::{Input, Origin, Pipeline, Stage};
pub use registry::{Category, ModuleInfo, ModuleRegistry, Schema};
pub use result::{BuildResults, PipelineOutcome, StageOutcome};
pub use runner::{FixedRunner, OsRelease, RunnerResolver};
pub use validation::{PathSegment, ValidationError, ValidationResult};
