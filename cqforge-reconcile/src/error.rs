//! Error types for cqforge-reconcile.

use thiserror::Error;

use cqforge_core::{ManifestError, NodePath};
use cqforge_http::TransportError;

/// All errors that abort a reconciliation pass.
///
/// Benign no-ops (deleting an absent node, an already-converged node) are
/// outcomes, not errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Network or connection failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote body is not valid JSON.
    #[error("malformed JSON from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The remote body is JSON but not the expected object.
    #[error("unexpected JSON from {path}: expected an object, found {found}")]
    UnexpectedShape { path: String, found: &'static str },

    /// The write API answered with a non-2xx status.
    #[error(
        "something went wrong during operation on {path}\n\
         HTTP response code: {status}\n\
         HTTP response body: {body}\n\
         Please check error.log on the instance for more info."
    )]
    WriteRejected {
        path: NodePath,
        status: u16,
        body: String,
    },

    /// Modify was requested for a node that does not exist; use create instead.
    #[error("node {path} does not exist; use the create action instead of modify")]
    NodeMissing { path: NodePath },

    /// A create/modify request arrived without a reconciliation policy.
    #[error("node {path} has no reconciliation policy")]
    MissingPolicy { path: NodePath },

    /// `--node` selected a path the manifest does not declare.
    #[error("node {path} is not declared in the manifest")]
    UnknownNode { path: NodePath },

    /// A node refers to an instance the manifest does not declare.
    #[error("instance '{instance}' is not declared in the manifest")]
    UnknownInstance { instance: String },

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}
