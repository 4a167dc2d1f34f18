//! Manifold CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "manifold")]
#[command(about = "Validate, describe and report on build manifests", long_about = None)]
struct Cli {
    /// System configuration file
    #[arg(long, env = "MANIFOLD_CONFIG")]
    config: Option<PathBuf>,

    /// Module library directory, overrides the configuration
    #[arg(long, env = "MANIFOLD_LIBDIR")]
    libdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest against the module schemas
    Validate {
        /// Path to the manifest
        path: PathBuf,
        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a manifest and print its canonical description
    Describe {
        /// Path to the manifest
        path: PathBuf,
        /// Write pipeline and stage ids instead of names
        #[arg(long)]
        with_id: bool,
    },
    /// Turn raw build results into a result document
    Report {
        /// Path to the manifest that was built
        manifest: PathBuf,
        /// Path to the raw build results
        results: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.libdir)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { path, json } => {
            commands::validate(&config, &path, json)?;
        }
        Commands::Describe { path, with_id } => {
            commands::describe(&config, &path, with_id)?;
        }
        Commands::Report { manifest, results } => {
            commands::report::report(&config, &manifest, &results)?;
        }
    }

    Ok(())
}
