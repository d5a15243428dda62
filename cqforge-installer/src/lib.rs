//! # cqforge-installer
//!
//! Idempotent provisioning of a content-repository instance: home directory,
//! quickstart jar, unpacked runtime and license file.
//!
//! Call [`install`] with an [`InstallSpec`](cqforge_core::InstallSpec); every
//! step reports whether it changed anything.

pub mod error;
pub mod installer;
pub mod paths;

pub use error::InstallError;
pub use installer::{install, install_with, InstallReport, Step, StepResult};
