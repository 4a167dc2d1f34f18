//! Object identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::Error;

/// A content-derived identifier for pipelines and stages.
///
/// Identifiers are SHA-256 digests over a canonical JSON rendering of the
/// object they name, so loading the same manifest twice yields the same ids.
/// They render as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Create an ObjectId from a raw digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Identifier of the pipeline called `name`.
    ///
    /// Pipeline names are unique within a manifest, so the name alone
    /// determines the id.
    pub fn for_pipeline(name: &str) -> Self {
        Self::digest(&json!({ "pipeline": name }))
    }

    /// Identifier of a stage, chained onto the stage before it.
    ///
    /// `content` is everything that determines the stage's output other
    /// than its base: the owning pipeline, its build pipeline, the stage
    /// type, options and inputs.
    pub fn for_stage(base: Option<&ObjectId>, content: &Value) -> Self {
        Self::digest(&json!({
            "base": base.map(ToString::to_string),
            "stage": content,
        }))
    }

    fn digest(value: &Value) -> Self {
        let canonical = canonicalize(value).to_string();
        Self(Sha256::digest(canonical.as_bytes()).into())
    }
}

/// Rebuild `value` with every object's keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl std::str::FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| Error::InvalidInput(format!("object id '{}': {}", s, e)))?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!("object id '{}': expected 32 bytes", s))
        })?;
        Ok(Self(digest))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
