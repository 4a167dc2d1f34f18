//! Result report command.

use anyhow::{Context, Result};
use manifold_config::SystemConfig;
use manifold_core::BuildResults;
use std::path::Path;

use super::{load_manifest, open_index, read_json};

/// Print the result document for a manifest's raw build results.
pub fn report(config: &SystemConfig, manifest_path: &Path, results_path: &Path) -> Result<()> {
    let index = open_index(config)?;
    let manifest = load_manifest(config, &index, manifest_path)?;

    let results: BuildResults = serde_json::from_value(read_json(results_path)?)
        .with_context(|| format!("Malformed build results: {}", results_path.display()))?;

    let document = manifold_format::output(&manifest, &results);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
