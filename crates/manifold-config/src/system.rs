//! System configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use manifold_core::runner::{FixedRunner, OsRelease, RunnerResolver};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default module library location.
pub const DEFAULT_LIBDIR: &str = "/usr/lib/manifold";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// System-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Module library holding stage, input and source metadata.
    pub libdir: PathBuf,
    /// Fixed host runner; detected from os-release when unset.
    pub runner: Option<String>,
    /// os-release files to detect the host runner from, in order.
    pub os_release: Vec<PathBuf>,
    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            libdir: PathBuf::from(DEFAULT_LIBDIR),
            runner: None,
            os_release: OsRelease::DEFAULT_PATHS.iter().map(PathBuf::from).collect(),
            log_level: "info".to_string(),
        }
    }
}

impl SystemConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_system_config(&content)
    }

    /// The resolver for the runner of pipelines without a build pipeline.
    pub fn runner_resolver(&self) -> Box<dyn RunnerResolver> {
        match &self.runner {
            Some(runner) => Box::new(FixedRunner(runner.clone())),
            None => Box::new(OsRelease::new(self.os_release.clone())),
        }
    }
}

/// Parse system configuration from KDL text.
///
/// ```kdl
/// libdir "/usr/lib/manifold"
/// runner "org.osbuild.fedora38"
/// os-release "/etc/os-release" "/usr/lib/os-release"
/// log-level "debug"
/// ```
///
/// Every node is optional; unknown nodes are ignored.
pub fn parse_system_config(kdl: &str) -> ConfigResult<SystemConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = SystemConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "libdir" => {
                config.libdir = PathBuf::from(get_required_string(node, "libdir")?);
            }
            "runner" => {
                config.runner = Some(get_required_string(node, "runner")?);
            }
            "os-release" => {
                let paths = get_all_string_args(node);
                if paths.is_empty() {
                    return Err(ConfigError::MissingField("os-release path".to_string()));
                }
                config.os_release = paths.into_iter().map(PathBuf::from).collect();
            }
            "log-level" => {
                let level = get_required_string(node, "log-level")?;
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: "log-level".to_string(),
                        message: format!("unknown level: {}", level),
                    });
                }
                config.log_level = level;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(config)
}

// Helper functions for extracting values from KDL nodes

fn get_required_string(node: &KdlNode, field: &str) -> ConfigResult<String> {
    let entry = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .ok_or_else(|| ConfigError::MissingField(field.to_string()))?;

    entry
        .value()
        .as_string()
        .map(|s| s.to_string())
        .ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            message: "expected a string".to_string(),
        })
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let kdl = r#"
            libdir "/opt/manifold/lib"
            runner "org.osbuild.rhel94"
            os-release "/run/os-release" "/etc/os-release"
            log-level "debug"
        "#;

        let config = parse_system_config(kdl).unwrap();
        assert_eq!(config.libdir, PathBuf::from("/opt/manifold/lib"));
        assert_eq!(config.runner.as_deref(), Some("org.osbuild.rhel94"));
        assert_eq!(
            config.os_release,
            vec![PathBuf::from("/run/os-release"), PathBuf::from("/etc/os-release")]
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_system_config("").unwrap();
        assert_eq!(config, SystemConfig::default());
        assert_eq!(config.libdir, PathBuf::from(DEFAULT_LIBDIR));
    }

    #[test]
    fn test_unknown_nodes_are_ignored() {
        let config = parse_system_config(r#"cache "/var/cache""#).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let result = parse_system_config("libdir 5");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = parse_system_config(r#"log-level "loud""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = parse_system_config("runner");
        assert!(matches!(result, Err(ConfigError::MissingField(_))));

        let result = parse_system_config("libdir {");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_runner_resolver() {
        let config = parse_system_config(r#"runner "org.osbuild.fedora38""#).unwrap();
        assert_eq!(
            config.runner_resolver().host_runner().unwrap(),
            "org.osbuild.fedora38"
        );

        let dir = tempfile::tempdir().unwrap();
        let os_release = dir.path().join("os-release");
        std::fs::write(&os_release, "ID=centos\nVERSION_ID=\"9\"\n").unwrap();

        let config = SystemConfig {
            os_release: vec![os_release],
            ..SystemConfig::default()
        };
        assert_eq!(
            config.runner_resolver().host_runner().unwrap(),
            "org.osbuild.centos9"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifold.kdl");
        std::fs::write(&path, r#"libdir "/srv/modules""#).unwrap();

        let config = SystemConfig::load(&path).unwrap();
        assert_eq!(config.libdir, PathBuf::from("/srv/modules"));

        let missing = SystemConfig::load(&dir.path().join("missing.kdl"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
