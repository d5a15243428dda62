pub mod apply;
pub mod diff;
pub mod install;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cqforge_core::{manifest, Manifest, NodePath};
use cqforge_reconcile::NodeScope;

/// Flags shared by every command that reads the manifest.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Manifest to read (default: ~/.cqforge/manifest.yaml).
    #[arg(long, short = 'm', value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

impl ManifestArgs {
    pub fn load(&self) -> Result<Manifest> {
        let loaded = match &self.manifest {
            Some(path) => manifest::load(path),
            None => manifest::load_default(),
        };
        loaded.context("could not load manifest")
    }
}

/// `--node <path>` narrows a run to one declared path.
pub fn scope(node: Option<&str>) -> Result<NodeScope> {
    match node {
        None => Ok(NodeScope::All),
        Some(raw) => {
            let path = NodePath::new(raw).context("--node must not be empty")?;
            Ok(NodeScope::Path(path))
        }
    }
}
