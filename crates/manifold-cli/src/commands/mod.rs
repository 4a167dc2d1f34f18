//! CLI command implementations.

pub mod report;

use anyhow::{Context, Result, bail};
use manifold_config::SystemConfig;
use manifold_core::Manifest;
use manifold_core::registry::Category;
use manifold_core::validation::ValidationResult;
use manifold_format::{VERSION, detect_version};
use manifold_index::Index;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read the system configuration, falling back to defaults when no file is
/// given.
pub fn load_config(path: Option<&Path>, libdir: Option<PathBuf>) -> Result<SystemConfig> {
    let mut config = match path {
        Some(path) => SystemConfig::load(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?,
        None => SystemConfig::default(),
    };

    if let Some(libdir) = libdir {
        config.libdir = libdir;
    }
    Ok(config)
}

pub fn validate(config: &SystemConfig, path: &Path, json: bool) -> Result<()> {
    let index = open_index(config)?;
    let raw = read_json(path)?;
    let result = validate_raw(&raw, &index)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.report())?);
    } else if result.is_valid() {
        println!("Manifest is valid");
    } else {
        print_errors(&result);
    }

    if !result.is_valid() {
        bail!("Manifest is invalid: {}", path.display());
    }
    Ok(())
}

pub fn describe(config: &SystemConfig, path: &Path, with_id: bool) -> Result<()> {
    let index = open_index(config)?;
    let manifest = load_manifest(config, &index, path)?;

    let description = manifold_format::describe(&manifest, with_id);
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

/// Read, validate and load a manifest.
pub(crate) fn load_manifest(config: &SystemConfig, index: &Index, path: &Path) -> Result<Manifest> {
    let raw = read_json(path)?;

    let result = validate_raw(&raw, index)?;
    if !result.is_valid() {
        print_errors(&result);
        bail!("Manifest is invalid: {}", path.display());
    }

    let runners = config.runner_resolver();
    let manifest = manifold_format::load_value(&raw, index, runners.as_ref())
        .with_context(|| format!("Failed to load manifest: {}", path.display()))?;

    info!(
        path = %path.display(),
        pipelines = manifest.pipelines().len(),
        "Loaded manifest"
    );
    Ok(manifest)
}

fn validate_raw(raw: &Value, index: &Index) -> Result<ValidationResult> {
    match detect_version(raw) {
        Some(VERSION) => Ok(manifold_format::validate(raw, index)),
        Some(version) => bail!("Unsupported manifest version: {}", version),
        None => bail!("Manifest does not declare a version"),
    }
}

fn open_index(config: &SystemConfig) -> Result<Index> {
    let index = Index::load(&config.libdir)
        .with_context(|| format!("Failed to load module library: {}", config.libdir.display()))?;
    debug!(
        libdir = ?index.libdir(),
        stages = index.list(Category::Stage).len(),
        inputs = index.list(Category::Input).len(),
        sources = index.list(Category::Source).len(),
        "Opened module library"
    );
    Ok(index)
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

fn print_errors(result: &ValidationResult) {
    println!("Manifest validation failed:");
    for error in result.errors() {
        println!("  {}", error);
    }
}
