//! Error types for cqforge-core.

use std::path::PathBuf;

use thiserror::Error;

/// A node path was empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node path must not be empty")]
pub struct EmptyNodePath;

/// All errors that can arise from loading and validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, with the manifest path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.cqforge/`.
    #[error("cannot determine home directory; set $HOME or pass --manifest")]
    HomeNotFound,

    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// A node refers to an instance that is not declared.
    #[error("{path}: node {node} refers to undeclared instance '{instance}'")]
    UnknownInstance {
        path: PathBuf,
        node: String,
        instance: String,
    },

    /// A create/modify node has no explicit reconciliation policy.
    #[error("{path}: node {node} must declare `policy: merge` or `policy: replace`")]
    MissingPolicy { path: PathBuf, node: String },

    /// A property is declared as an empty list.
    #[error("{path}: node {node} declares `{property}` as an empty list; omit it instead")]
    EmptyList {
        path: PathBuf,
        node: String,
        property: String,
    },

    /// An instance has neither `password` nor `password_env`.
    #[error("instance '{instance}' has no password; set `password` or `password_env`")]
    MissingPassword { instance: String },

    /// `password_env` names a variable that is not set.
    #[error("instance '{instance}': environment variable {var} is not set")]
    PasswordEnv { instance: String, var: String },
}
