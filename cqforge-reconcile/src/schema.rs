//! Schema Introspector: protected property names per primary type.

use std::collections::BTreeSet;

use serde_json::Value;

use cqforge_core::PRIMARY_TYPE;
use cqforge_http::Transport;

use crate::error::ReconcileError;
use crate::reader::decode_object;
use crate::session::Session;

/// Where node type descriptors are rendered.
pub const NODE_TYPES_ROOT: &str = "/jcr:system/jcr:nodeTypes";

/// Field of a node type descriptor listing protected properties.
pub const PROTECTED_FIELD: &str = "rep:protectedProperties";

/// Property names the write API refuses to modify for one primary type.
pub type ProtectedProperties = BTreeSet<String>;

/// `/jcr:system/jcr:nodeTypes/<type>.json`
pub fn descriptor_path(primary_type: &str) -> String {
    format!("{NODE_TYPES_ROOT}/{primary_type}.json")
}

/// Fetch the protected properties of `primary_type`.
///
/// An unknown type (absent, empty, or not served by the instance) protects
/// nothing beyond the auto-generated properties.
pub fn protected_properties<T: Transport>(
    session: &Session<T>,
    primary_type: Option<&str>,
) -> Result<ProtectedProperties, ReconcileError> {
    let Some(primary_type) = primary_type.filter(|t| !t.is_empty()) else {
        return Ok(ProtectedProperties::new());
    };

    let req_path = descriptor_path(primary_type);
    let resp = session.get(&req_path)?;
    if resp.status != 200 {
        tracing::warn!(
            primary_type,
            status = resp.status,
            "node type descriptor unavailable; treating type as unknown"
        );
        return Ok(ProtectedProperties::new());
    }

    let protected = decode_protected(&req_path, &resp.body)?;
    tracing::debug!(primary_type, count = protected.len(), "protected properties");
    Ok(protected)
}

/// Read `rep:protectedProperties` from a node type descriptor.
///
/// Older releases omit the field entirely, which yields an empty set.
/// `jcr:primaryType` is always dropped: it can be re-set in practice.
pub fn decode_protected(source: &str, body: &str) -> Result<ProtectedProperties, ReconcileError> {
    let descriptor = decode_object(source, body)?;
    let mut protected: ProtectedProperties = match descriptor.get(PROTECTED_FIELD) {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|n| n.as_str().map(str::to_owned))
            .collect(),
        Some(Value::Object(names)) => names.keys().cloned().collect(),
        _ => ProtectedProperties::new(),
    };
    protected.remove(PRIMARY_TYPE);
    Ok(protected)
}
