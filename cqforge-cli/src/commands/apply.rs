//! `cqforge apply`: reconcile declared nodes.

use anyhow::{Context, Result};
use clap::Args;

use cqforge_reconcile::{pipeline, NodeReport, Outcome};

use super::{scope, ManifestArgs};

/// Arguments for `cqforge apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Only reconcile this node path.
    #[arg(long, value_name = "PATH")]
    pub node: Option<String>,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.manifest.load()?;
        let scope = scope(self.node.as_deref())?;

        let reports =
            pipeline::run_remote(&manifest, &scope, self.dry_run).context("apply failed")?;
        if reports.is_empty() {
            println!("No nodes declared in the manifest.");
            return Ok(());
        }
        print_reports(&reports, self.dry_run);
        Ok(())
    }
}

fn print_reports(reports: &[NodeReport], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let changed = reports.iter().filter(|r| r.outcome.changes()).count();

    println!(
        "{prefix}✓ {} node(s) reconciled ({changed} changed, {} unchanged)",
        reports.len(),
        reports.len() - changed
    );

    for r in reports {
        let (symbol, verb) = match &r.outcome {
            Outcome::Created { .. } => ("✎", "created".to_owned()),
            Outcome::Updated { delta, .. } => ("✎", format!("updated {} properties", delta.len())),
            Outcome::Deleted { .. } => ("✎", "deleted".to_owned()),
            Outcome::Unchanged { .. } => ("·", "unchanged".to_owned()),
            Outcome::AlreadyAbsent { .. } => ("·", "already absent".to_owned()),
            Outcome::WouldCreate { .. } => ("~", "would create".to_owned()),
            Outcome::WouldUpdate { delta, .. } => {
                ("~", format!("would update {} properties", delta.len()))
            }
            Outcome::WouldDelete { .. } => ("~", "would delete".to_owned()),
        };
        println!("  {symbol}  {} {} ({verb})", r.instance, r.outcome.path());
    }
}
