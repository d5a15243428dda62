//! Shared reconciliation entrypoint used by `cqforge apply` and `cqforge diff`.

use cqforge_core::{Action, InstanceConfig, Manifest, NodeDeclaration, NodePath};
use cqforge_http::{Transport, UreqTransport};

use crate::error::ReconcileError;
use crate::reconciler::{Outcome, Reconciler};
use crate::session::Session;

/// Which declared nodes a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeScope {
    /// Every node in the manifest, in declaration order.
    All,
    /// Every declaration for this path (one per instance).
    Path(NodePath),
}

/// Result of one node's pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub instance: String,
    pub action: Action,
    pub outcome: Outcome,
}

/// Reconcile every node in `scope`, one pass after another.
///
/// `connect` builds the transport for an instance. The first error aborts the
/// run; passes already completed are not rolled back.
pub fn run<T, F>(
    manifest: &Manifest,
    scope: &NodeScope,
    dry_run: bool,
    mut connect: F,
) -> Result<Vec<NodeReport>, ReconcileError>
where
    T: Transport,
    F: FnMut(&str, &InstanceConfig) -> T,
{
    let selected: Vec<&NodeDeclaration> = match scope {
        NodeScope::All => manifest.nodes.iter().collect(),
        NodeScope::Path(path) => {
            let matching: Vec<_> = manifest.nodes.iter().filter(|n| &n.path == path).collect();
            if matching.is_empty() {
                return Err(ReconcileError::UnknownNode { path: path.clone() });
            }
            matching
        }
    };

    let mut reports = Vec::with_capacity(selected.len());
    for node in selected {
        let config = manifest
            .instance(&node.instance)
            .ok_or_else(|| ReconcileError::UnknownInstance {
                instance: node.instance.clone(),
            })?;
        let session = Session::new(
            connect(&node.instance, config),
            config.credentials(&node.instance)?,
            config.deadline(),
        );
        let reconciler = Reconciler::new(session, dry_run);

        let outcome = match (node.action, node.desired_state()) {
            (Action::Delete, _) => reconciler.delete(&node.path)?,
            (action, Some(desired)) => reconciler.apply(action, &desired)?,
            (_, None) => {
                return Err(ReconcileError::MissingPolicy {
                    path: node.path.clone(),
                })
            }
        };

        reports.push(NodeReport {
            instance: node.instance.clone(),
            action: node.action,
            outcome,
        });
    }
    Ok(reports)
}

/// [`run`] against the instances' real URLs.
pub fn run_remote(
    manifest: &Manifest,
    scope: &NodeScope,
    dry_run: bool,
) -> Result<Vec<NodeReport>, ReconcileError> {
    run(manifest, scope, dry_run, |_, config| {
        UreqTransport::new(config.url.as_str())
    })
}
