//! Reconciler: dispatches create / delete / modify for one node.
//!
//! ## One pass
//!
//! 1. Fetch actual state (never cached across passes).
//! 2. Pick the branch for the requested action.
//! 3. For updates: raw diff under the desired policy; if non-empty, look up
//!    the protected properties once and filter.
//! 4. Empty delta → `Unchanged`, no write.
//! 5. Otherwise POST and require a `20x` answer.

use cqforge_core::{Action, ActualState, Delta, DesiredState, NodePath, PropertySet};
use cqforge_http::Transport;

use crate::diff;
use crate::error::ReconcileError;
use crate::reader;
use crate::schema::{self, ProtectedProperties};
use crate::session::Session;

/// Form sent to remove a node.
pub const DELETE_OPERATION: (&str, &str) = (":operation", "delete");

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a pass did (or, in dry-run mode, would have done).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Node was absent and has been written with the full desired properties.
    Created { path: NodePath },
    /// Node existed and the delta was written.
    Updated { path: NodePath, delta: Delta },
    /// Node existed and has been removed.
    Deleted { path: NodePath },
    /// Node already matches the desired state; nothing was written.
    Unchanged { path: NodePath },
    /// Delete requested for a node that is not there; nothing was written.
    AlreadyAbsent { path: NodePath },
    /// Dry-run: the node would be created with these properties.
    WouldCreate {
        path: NodePath,
        properties: PropertySet,
    },
    /// Dry-run: this delta would be written.
    WouldUpdate { path: NodePath, delta: Delta },
    /// Dry-run: the node would be removed.
    WouldDelete { path: NodePath },
}

impl Outcome {
    pub fn path(&self) -> &NodePath {
        match self {
            Outcome::Created { path }
            | Outcome::Updated { path, .. }
            | Outcome::Deleted { path }
            | Outcome::Unchanged { path }
            | Outcome::AlreadyAbsent { path }
            | Outcome::WouldCreate { path, .. }
            | Outcome::WouldUpdate { path, .. }
            | Outcome::WouldDelete { path } => path,
        }
    }

    /// `true` when a write was issued.
    pub fn wrote(&self) -> bool {
        matches!(
            self,
            Outcome::Created { .. } | Outcome::Updated { .. } | Outcome::Deleted { .. }
        )
    }

    /// `true` when a write was issued or would have been in dry-run mode.
    pub fn changes(&self) -> bool {
        !matches!(
            self,
            Outcome::Unchanged { .. } | Outcome::AlreadyAbsent { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Per-pass context
// ---------------------------------------------------------------------------

/// State scoped to a single reconciliation pass.
///
/// The protected set is fetched at most once, keyed by the primary type it
/// was resolved for; a node's type does not change mid-pass.
struct PassContext<'a, T> {
    session: &'a Session<T>,
    actual: ActualState,
    protected: Option<(Option<String>, ProtectedProperties)>,
}

impl<'a, T: Transport> PassContext<'a, T> {
    fn begin(session: &'a Session<T>, path: &NodePath) -> Result<Self, ReconcileError> {
        Ok(Self {
            session,
            actual: reader::fetch(session, path)?,
            protected: None,
        })
    }

    fn protected(
        &mut self,
        desired: &PropertySet,
    ) -> Result<&ProtectedProperties, ReconcileError> {
        let primary_type =
            diff::resolve_primary_type(desired, &self.actual.properties).map(str::to_owned);
        let entry = match self.protected.take() {
            Some(entry) if entry.0 == primary_type => entry,
            _ => {
                let set = schema::protected_properties(self.session, primary_type.as_deref())?;
                (primary_type, set)
            }
        };
        let (_, set) = self.protected.insert(entry);
        Ok(&*set)
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives passes against one instance.
#[derive(Debug, Clone)]
pub struct Reconciler<T> {
    session: Session<T>,
    dry_run: bool,
}

impl<T: Transport> Reconciler<T> {
    pub fn new(session: Session<T>, dry_run: bool) -> Self {
        Self { session, dry_run }
    }

    /// Run one pass for `action`. Delete only looks at `desired.path`.
    pub fn apply(&self, action: Action, desired: &DesiredState) -> Result<Outcome, ReconcileError> {
        match action {
            Action::Create => self.create(desired),
            Action::Delete => self.delete(&desired.path),
            Action::Modify => self.modify(desired),
        }
    }

    /// Write the full desired properties to an absent node; converge an existing one.
    pub fn create(&self, desired: &DesiredState) -> Result<Outcome, ReconcileError> {
        let mut pass = PassContext::begin(&self.session, &desired.path)?;
        if pass.actual.exists {
            return self.apply_update(&mut pass, desired);
        }

        let path = desired.path.clone();
        if self.dry_run {
            tracing::info!(%path, "[dry-run] would create node");
            return Ok(Outcome::WouldCreate {
                path,
                properties: desired.properties.clone(),
            });
        }

        self.write(&path, &desired.properties.form_fields())?;
        tracing::info!(%path, "created node");
        Ok(Outcome::Created { path })
    }

    /// Remove an existing node. An absent node is a no-op.
    pub fn delete(&self, path: &NodePath) -> Result<Outcome, ReconcileError> {
        let pass = PassContext::begin(&self.session, path)?;
        if !pass.actual.exists {
            tracing::info!(%path, "node does not exist, nothing to delete");
            return Ok(Outcome::AlreadyAbsent { path: path.clone() });
        }

        if self.dry_run {
            tracing::info!(%path, "[dry-run] would delete node");
            return Ok(Outcome::WouldDelete { path: path.clone() });
        }

        let (op, value) = DELETE_OPERATION;
        self.write(path, &[(op.to_owned(), value.to_owned())])?;
        tracing::info!(%path, "deleted node");
        Ok(Outcome::Deleted { path: path.clone() })
    }

    /// Converge an existing node. A missing node is an error.
    pub fn modify(&self, desired: &DesiredState) -> Result<Outcome, ReconcileError> {
        let mut pass = PassContext::begin(&self.session, &desired.path)?;
        if !pass.actual.exists {
            return Err(ReconcileError::NodeMissing {
                path: desired.path.clone(),
            });
        }
        self.apply_update(&mut pass, desired)
    }

    fn apply_update(
        &self,
        pass: &mut PassContext<'_, T>,
        desired: &DesiredState,
    ) -> Result<Outcome, ReconcileError> {
        let path = desired.path.clone();
        let delta = delta_for(pass, desired)?;

        if delta.is_empty() {
            tracing::info!(%path, "node is already configured as defined");
            return Ok(Outcome::Unchanged { path });
        }

        if self.dry_run {
            tracing::info!(%path, changes = delta.len(), "[dry-run] would update node");
            return Ok(Outcome::WouldUpdate { path, delta });
        }

        self.write(&path, &delta.form_fields())?;
        tracing::info!(%path, changes = delta.len(), "updated node");
        Ok(Outcome::Updated { path, delta })
    }

    fn write(&self, path: &NodePath, form: &[(String, String)]) -> Result<(), ReconcileError> {
        let resp = self.session.post(path.as_str(), form)?;
        if !resp.is_success() {
            return Err(ReconcileError::WriteRejected {
                path: path.clone(),
                status: resp.status,
                body: resp.body,
            });
        }
        Ok(())
    }
}

fn delta_for<T: Transport>(
    pass: &mut PassContext<'_, T>,
    desired: &DesiredState,
) -> Result<Delta, ReconcileError> {
    let mut delta = diff::raw_diff(desired.policy, &pass.actual.properties, &desired.properties);
    if delta.is_empty() {
        return Ok(delta);
    }
    let protected = pass.protected(&desired.properties)?;
    diff::filter_editable(&mut delta, protected);
    Ok(delta)
}
