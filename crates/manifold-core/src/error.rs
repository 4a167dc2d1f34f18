//! Error types for Manifold.

use thiserror::Error;

use crate::registry::Category;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown {category} module type: {name}")]
    UnknownModule { category: Category, name: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
