//! Manifest format errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unresolved pipeline reference: {0}")]
    UnresolvedReference(String),

    #[error("ambiguous pipeline reference: more than one pipeline is named '{0}'")]
    AmbiguousReference(String),

    #[error("cycle detected in build pipelines: {0}")]
    CycleDetected(String),

    #[error("unsupported manifest version: {0}")]
    UnsupportedVersion(String),

    #[error("malformed manifest description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] manifold_core::Error),
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;
