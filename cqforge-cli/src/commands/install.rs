//! `cqforge install <instance>`: provision a declared instance.

use anyhow::{Context, Result};
use clap::Args;

use cqforge_installer::{install, Step, StepResult};

use super::ManifestArgs;

/// Arguments for `cqforge install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Instance name as declared under `instances:`.
    pub instance: String,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

impl InstallArgs {
    pub fn run(self) -> Result<()> {
        let manifest = self.manifest.load()?;
        let config = manifest
            .instance(&self.instance)
            .with_context(|| format!("instance '{}' is not declared", self.instance))?;
        let spec = config
            .install
            .as_ref()
            .with_context(|| format!("instance '{}' has no install section", self.instance))?;

        let report =
            install(spec).with_context(|| format!("install failed for '{}'", self.instance))?;

        let created = report.steps.iter().filter(|s| s.changed()).count();
        if created == 0 {
            println!("✓ '{}' — nothing to do", self.instance);
        } else {
            println!(
                "✓ '{}' installed at {} ({created} step(s) changed)",
                self.instance,
                report.instance_home.display()
            );
        }
        for step in &report.steps {
            let (symbol, path) = match step {
                StepResult::Created { path, .. } => ("✎", path),
                StepResult::Unchanged { path, .. } => ("·", path),
            };
            println!("  {symbol}  {:<8} {}", label(step.step()), path.display());
        }
        Ok(())
    }
}

fn label(step: Step) -> &'static str {
    match step {
        Step::InstanceHome => "home",
        Step::Jar => "jar",
        Step::Unpack => "unpack",
        Step::License => "license",
    }
}
