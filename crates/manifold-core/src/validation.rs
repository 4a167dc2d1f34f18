//! Validation results.
//!
//! Validation never fails fast: every problem found in a document is
//! collected, tagged with the structural path where it occurred, and
//! returned together.

use derive_more::From;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, From, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Render the path as `.pipelines[1].stages[0]`; the document root is `.`.
    pub fn id(&self) -> String {
        if self.path.is_empty() {
            return ".".to_string();
        }

        let mut id = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Index(i) => id.push_str(&format!("[{}]", i)),
                PathSegment::Key(k) => {
                    id.push('.');
                    id.push_str(k);
                }
            }
        }
        id
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id(), self.message)
    }
}

/// The aggregated outcome of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// What was validated (e.g., a schema name).
    pub origin: Option<String>,
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new(origin: Option<String>) -> Self {
        Self {
            origin,
            errors: Vec::new(),
        }
    }

    /// Record an error at the document root.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(ValidationError::new(message));
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append all errors of `other`, each prefixed with `path`.
    pub fn merge(&mut self, other: ValidationResult, path: &[PathSegment]) {
        self.errors.extend(other.errors.into_iter().map(|mut error| {
            let mut full = path.to_vec();
            full.append(&mut error.path);
            error.path = full;
            error
        }));
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Serialisable summary of this result.
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            success: self.is_valid(),
            title: "JSON Schema validation failed".to_string(),
            errors: self.errors.clone(),
        }
    }
}

/// Machine readable form of a [`ValidationResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub success: bool,
    pub title: String,
    pub errors: Vec<ValidationError>,
}
