//! cqforge: declarative node state for CQ / AEM content repositories.
//!
//! # Usage
//!
//! ```text
//! cqforge apply [--manifest <path>] [--node <path>] [--dry-run]
//! cqforge diff [--manifest <path>] [--node <path>]
//! cqforge install <instance> [--manifest <path>]
//! ```
//!
//! The manifest defaults to `~/.cqforge/manifest.yaml`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, diff::DiffArgs, install::InstallArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cqforge",
    version,
    about = "Converge content-repository nodes to a declared state",
    long_about = None,
)]
struct Cli {
    /// Log each read and write (same as RUST_LOG=info).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile declared nodes against their instances.
    Apply(ApplyArgs),

    /// Show the changes `apply` would make, without writing.
    Diff(DiffArgs),

    /// Provision a declared instance: directory, jar, unpack, license.
    Install(InstallArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Apply(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Install(args) => args.run(),
    }
}

/// `RUST_LOG` wins when set; otherwise `warn`, or `info` with `-v`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
