//! Host runner detection.
//!
//! Pipelines without a build pipeline run directly on the host, so their
//! runner is picked from the host's operating system rather than the
//! manifest.

use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

use crate::{Error, Result};

/// Trait for resolving the runner used by root pipelines.
pub trait RunnerResolver: Send + Sync {
    fn host_runner(&self) -> Result<String>;
}

/// Always resolves to the same runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRunner(pub String);

impl RunnerResolver for FixedRunner {
    fn host_runner(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

// KEY=value lines of os-release(5)
static FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)=(.*?)\s*$").unwrap());

/// Derives the runner from os-release(5): `org.osbuild.<ID><VERSION_ID>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// Candidate files, first readable one wins.
    pub paths: Vec<PathBuf>,
}

impl OsRelease {
    pub const DEFAULT_PATHS: [&'static str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Parse os-release content into its fields. Comments and malformed
    /// lines are skipped; surrounding quotes are removed.
    pub fn parse(content: &str) -> HashMap<String, String> {
        content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .filter_map(|line| FIELD_REGEX.captures(line))
            .map(|caps| {
                let value = caps[2]
                    .trim_matches(|c: char| c == '"' || c == '\'')
                    .to_string();
                (caps[1].to_string(), value)
            })
            .collect()
    }

    /// Short OS name, e.g. "fedora38" or "rhel94".
    pub fn describe(fields: &HashMap<String, String>) -> Result<String> {
        let id = fields
            .get("ID")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidInput("os-release is missing ID".to_string()))?;
        let version = fields
            .get("VERSION_ID")
            .map(|v| v.replace('.', ""))
            .unwrap_or_default();
        Ok(format!("{}{}", id, version))
    }
}

impl Default for OsRelease {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATHS.iter().map(PathBuf::from).collect())
    }
}

impl RunnerResolver for OsRelease {
    fn host_runner(&self) -> Result<String> {
        for path in &self.paths {
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            debug!(path = %path.display(), "Detecting host runner");
            let name = Self::describe(&Self::parse(&content))?;
            return Ok(format!("org.osbuild.{}", name));
        }

        Err(Error::NotFound(format!(
            "no readable os-release file in {:?}",
            self.paths
        )))
    }
}
