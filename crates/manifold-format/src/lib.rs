//! Version 2 of the manifest description format.
//!
//! This crate translates between manifest descriptions and the runnable
//! [`manifold_core::Manifest`] graph:
//! - [`load`]: description -> manifest, resolving pipeline references
//! - [`describe`]: manifest -> description
//! - [`validate`]: raw JSON document -> aggregated validation result
//! - [`output`]: raw build results -> result document

pub mod describe;
pub mod description;
pub mod error;
pub mod load;
pub mod output;
pub mod reference;
pub mod runners;
pub mod validate;

pub use describe::describe;
pub use description::{
    InputDescription, ManifestDescription, PipelineDescription, References, SourceDescription,
    StageDescription,
};
pub use error::{FormatError, FormatResult};
pub use load::{load, load_value};
pub use output::{ResultDocument, output};
pub use validate::validate;

use serde_json::Value;

/// Format version handled by this crate.
pub const VERSION: &str = "2";

/// The `version` a raw manifest document declares, if any.
pub fn detect_version(raw: &Value) -> Option<&str> {
    raw.get("version").and_then(Value::as_str)
}
