//! Pipeline references.
//!
//! A reference is either symbolic, `name:<pipeline-name>`, as written by
//! people, or a raw pipeline id.

use manifold_core::{Manifest, ObjectId};
use tracing::warn;

use crate::{FormatError, FormatResult};

const NAME_PREFIX: &str = "name:";

/// A parsed pipeline reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<'a> {
    Name(&'a str),
    Id(ObjectId),
}

impl<'a> Reference<'a> {
    pub fn parse(reference: &'a str) -> FormatResult<Self> {
        if let Some(name) = reference.strip_prefix(NAME_PREFIX) {
            return Ok(Reference::Name(name));
        }
        reference
            .parse()
            .map(Reference::Id)
            .map_err(|_| FormatError::UnresolvedReference(reference.to_string()))
    }
}

/// Resolve a reference to the id of a pipeline in `manifest`.
pub fn resolve(manifest: &Manifest, reference: &str) -> FormatResult<ObjectId> {
    let target = match Reference::parse(reference)? {
        Reference::Name(name) => manifest.by_name(name),
        Reference::Id(id) => manifest.get(&id),
    };
    target
        .map(|p| p.id)
        .ok_or_else(|| FormatError::UnresolvedReference(reference.to_string()))
}

/// Render a reference to pipeline `id`, symbolically unless `with_id`.
pub fn render(manifest: &Manifest, id: &ObjectId, with_id: bool) -> String {
    if with_id {
        return id.to_string();
    }

    match manifest.get(id) {
        Some(pipeline) => format!("{}{}", NAME_PREFIX, pipeline.name),
        None => {
            warn!(pipeline = %id, "Reference to a pipeline not in the manifest");
            id.to_string()
        }
    }
}
