//! cqforge core library: node-state domain types, manifest loading, errors.
//!
//! Public API surface:
//! - [`types`]: node paths, property sets, deltas, desired/actual state
//! - [`error`]: [`ManifestError`]
//! - [`manifest`]: load / validate the YAML manifest

pub mod error;
pub mod manifest;
pub mod types;

pub use error::{EmptyNodePath, ManifestError};
pub use manifest::{Artifact, InstallSpec, InstanceConfig, Manifest, NodeDeclaration};
pub use types::{
    Action, ActualState, Change, Credentials, Delta, DesiredState, FormFields, NodePath, Policy,
    PropertySet, PropertyValue, DELETE_SUFFIX, MULTI_STRING_HINT, PRIMARY_TYPE,
    TYPE_HINT_SUFFIX,
};
