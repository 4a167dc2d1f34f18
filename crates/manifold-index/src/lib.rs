//! Module registry for Manifold.
//!
//! Provides the [`Index`], which knows the stage, input and source modules of
//! a module library and validates documents against their JSON schemas.

pub mod error;
pub mod index;
pub mod schema;

pub use error::{IndexError, IndexResult};
pub use index::Index;
pub use schema::JsonSchema;

pub use manifold_core::registry::{Category, ModuleInfo, ModuleRegistry, Schema};
