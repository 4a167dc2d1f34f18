//! Module registry and schema traits.
//!
//! The registry supplies type metadata for the stage, input and source
//! modules a manifest names, and the JSON schemas used to validate raw
//! manifest documents before they are loaded.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::Result;
use crate::validation::ValidationResult;

/// The kind of thing a schema or module describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Category {
    Manifest,
    Source,
    Input,
    Stage,
}

impl Category {
    /// Library sub-directory holding modules of this category.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Category::Manifest => None,
            Category::Source => Some("sources"),
            Category::Input => Some("inputs"),
            Category::Stage => Some("stages"),
        }
    }
}

/// Metadata for one module type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Category of the module.
    pub category: Category,
    /// Type name (e.g., "org.osbuild.rpm").
    pub name: String,
    /// One-line summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Schema fragment for format version 2, keyed by the property it
    /// constrains (e.g., `options`, `inputs`, `items`).
    pub schema_2: Option<Value>,
}

impl ModuleInfo {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            summary: None,
            description: None,
            schema_2: None,
        }
    }

    /// Attach a version 2 schema fragment.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema_2 = Some(schema);
        self
    }
}

/// A compiled schema for one (category, name, version).
pub trait Schema: Send + Sync {
    /// Validate a document. Never fails; problems are reported in the result.
    fn validate(&self, document: &Value) -> ValidationResult;
}

/// Trait for module registries.
///
/// Implementations must be safe for concurrent reads.
pub trait ModuleRegistry: Send + Sync {
    /// Look up module metadata by category and type name.
    ///
    /// Fails with [`crate::Error::UnknownModule`] if the registry has no such module.
    fn module_info(&self, category: Category, name: &str) -> Result<Arc<ModuleInfo>>;

    /// Get the schema for a module, or for the manifest itself when `name`
    /// is `None`.
    ///
    /// Unknown names still yield a schema; it reports the lookup failure
    /// when used to validate.
    fn schema(&self, category: Category, name: Option<&str>, version: &str) -> Arc<dyn Schema>;
}
