//! Module index over a module library directory.

use manifold_core::registry::{Category, ModuleInfo, ModuleRegistry, Schema};
use manifold_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::schema::{JsonSchema, module_schema};
use crate::{IndexError, IndexResult};

/// The only manifest format version this index has schemas for.
pub const VERSION: &str = "2";

static DEFAULT_MANIFEST_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../schemas/manifest-v2.json")).unwrap()
});

/// Contents of a `<name>.meta.json` file.
#[derive(Debug, Default, Deserialize)]
struct ModuleMeta {
    summary: Option<String>,
    description: Option<String>,
    schema_2: Option<Value>,
}

/// Registry of the modules in a module library.
///
/// A library is laid out as:
///
/// ```text
/// <libdir>/schemas/manifest-v2.json   optional, replaces the built-in schema
/// <libdir>/stages/<name>.meta.json
/// <libdir>/inputs/<name>.meta.json
/// <libdir>/sources/<name>.meta.json
/// ```
#[derive(Debug, Clone)]
pub struct Index {
    libdir: Option<PathBuf>,
    manifest_schema: Value,
    modules: HashMap<(Category, String), Arc<ModuleInfo>>,
}

impl Index {
    /// Create an empty index with the built-in manifest schema.
    pub fn new() -> Self {
        Self {
            libdir: None,
            manifest_schema: DEFAULT_MANIFEST_SCHEMA.clone(),
            modules: HashMap::new(),
        }
    }

    /// Load every module found under `libdir`.
    pub fn load(libdir: impl Into<PathBuf>) -> IndexResult<Self> {
        let libdir = libdir.into();
        let mut index = Self::new();

        let manifest_path = libdir.join("schemas").join("manifest-v2.json");
        if manifest_path.is_file() {
            index = index.with_manifest_schema(read_json(&manifest_path)?);
        }

        for category in [Category::Source, Category::Input, Category::Stage] {
            let Some(dir_name) = category.dir_name() else {
                continue;
            };
            let dir = libdir.join(dir_name);
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(dir = %dir.display(), "No modules for category");
                    continue;
                }
                Err(source) => return Err(IndexError::Io { path: dir, source }),
            };

            for entry in entries {
                let path = entry
                    .map_err(|source| IndexError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                let Some(name) = path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .and_then(|f| f.strip_suffix(".meta.json"))
                else {
                    continue;
                };

                let meta: ModuleMeta =
                    serde_json::from_value(read_json(&path)?).map_err(|source| {
                        IndexError::Json {
                            path: path.clone(),
                            source,
                        }
                    })?;
                debug!(category = %category, name = %name, "Loaded module metadata");
                index.register(ModuleInfo {
                    category,
                    name: name.to_string(),
                    summary: meta.summary,
                    description: meta.description,
                    schema_2: meta.schema_2,
                });
            }
        }

        debug!(
            libdir = %libdir.display(),
            modules = index.modules.len(),
            "Loaded module index"
        );
        index.libdir = Some(libdir);
        Ok(index)
    }

    /// Add or replace a module.
    pub fn register(&mut self, info: ModuleInfo) -> &mut Self {
        self.modules
            .insert((info.category, info.name.clone()), Arc::new(info));
        self
    }

    /// Replace the manifest schema.
    pub fn with_manifest_schema(mut self, schema: Value) -> Self {
        self.manifest_schema = schema;
        self
    }

    pub fn libdir(&self) -> Option<&Path> {
        self.libdir.as_deref()
    }

    /// Names of all modules in `category`, sorted.
    pub fn list(&self, category: Category) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .modules
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry for Index {
    fn module_info(&self, category: Category, name: &str) -> Result<Arc<ModuleInfo>> {
        self.modules
            .get(&(category, name.to_string()))
            .cloned()
            .ok_or_else(|| Error::UnknownModule {
                category,
                name: name.to_string(),
            })
    }

    fn schema(&self, category: Category, name: Option<&str>, version: &str) -> Arc<dyn Schema> {
        let label = match name {
            Some(name) => format!("{} {}", category, name),
            None => category.to_string(),
        };

        if version != VERSION {
            return Arc::new(JsonSchema::missing(format!("{} (version {})", label, version)));
        }

        if category == Category::Manifest {
            return Arc::new(JsonSchema::compile(label, &self.manifest_schema));
        }

        match name.and_then(|n| self.modules.get(&(category, n.to_string()))) {
            Some(info) => Arc::new(JsonSchema::compile(label, &module_schema(info))),
            None => Arc::new(JsonSchema::missing(label)),
        }
    }
}

fn read_json(path: &Path) -> IndexResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })
}
