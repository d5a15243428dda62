//! # cqforge-reconcile
//!
//! Node-state reconciliation against the content API.
//!
//! [`Reconciler`] runs one pass for one node: read actual state, diff it
//! against the desired state under a [`Policy`](cqforge_core::Policy), strip
//! protected and auto-generated properties, and write only when something
//! changed. [`pipeline::run`] drives a whole manifest.

pub mod diff;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod reconciler;
pub mod schema;
pub mod session;

pub use error::ReconcileError;
pub use pipeline::{NodeReport, NodeScope};
pub use reconciler::{Outcome, Reconciler};
pub use schema::ProtectedProperties;
pub use session::Session;
