//! `cqforge diff`: print the property changes `apply` would make.

use anyhow::{Context, Result};
use clap::Args;

use cqforge_core::Change;
use cqforge_reconcile::{pipeline, Outcome};

use super::{scope, ManifestArgs};

/// Arguments for `cqforge diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Only diff this node path.
    #[arg(long, value_name = "PATH")]
    pub node: Option<String>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.manifest.load()?;
        let scope = scope(self.node.as_deref())?;

        let reports = pipeline::run_remote(&manifest, &scope, true).context("diff failed")?;

        let mut any = false;
        for r in &reports {
            let header = format!("{} {}", r.instance, r.outcome.path());
            match &r.outcome {
                Outcome::WouldCreate { properties, .. } => {
                    println!("+++ {header} (new node)");
                    for (name, value) in properties.iter() {
                        println!("+ {name} = {value}");
                    }
                }
                Outcome::WouldUpdate { delta, .. } => {
                    println!("~~~ {header}");
                    for (name, change) in delta.iter() {
                        match change {
                            Change::Set(value) => println!("+ {name} = {value}"),
                            Change::Delete => println!("- {name}"),
                        }
                    }
                }
                Outcome::WouldDelete { .. } => println!("--- {header} (delete node)"),
                _ => continue,
            }
            any = true;
        }

        if !any {
            println!("No differences.");
        }
        Ok(())
    }
}
