//! Node State Reader: fetch a node's current properties.

use serde_json::{Map, Value};

use cqforge_core::{ActualState, NodePath, PropertySet, PropertyValue};
use cqforge_http::Transport;

use crate::error::ReconcileError;
use crate::session::Session;

/// Fetch the current state of `path` via `GET {path}.json`.
///
/// Only a 200 counts as existing; any other status means absent.
pub fn fetch<T: Transport>(
    session: &Session<T>,
    path: &NodePath,
) -> Result<ActualState, ReconcileError> {
    let req_path = path.json_path();
    let resp = session.get(&req_path)?;
    if resp.status != 200 {
        tracing::debug!(%path, status = resp.status, "node absent");
        return Ok(ActualState::absent(path.clone()));
    }

    let properties = decode_properties(&req_path, &resp.body)?;
    tracing::debug!(%path, properties = properties.len(), "node present");
    Ok(ActualState {
        path: path.clone(),
        exists: true,
        properties,
    })
}

/// Parse a JSON object body into properties.
pub fn decode_properties(source: &str, body: &str) -> Result<PropertySet, ReconcileError> {
    let object = decode_object(source, body)?;
    Ok(object
        .iter()
        .filter_map(|(name, value)| property_value(value).map(|v| (name.clone(), v)))
        .collect())
}

/// Parse `body` as a JSON object, naming `source` in any error.
pub(crate) fn decode_object(source: &str, body: &str) -> Result<Map<String, Value>, ReconcileError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ReconcileError::Decode {
        path: source.to_owned(),
        source: e,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ReconcileError::UnexpectedShape {
            path: source.to_owned(),
            found: json_kind(&other),
        }),
    }
}

/// Scalars and arrays of scalars are properties; nulls and objects (child
/// nodes) are not.
fn property_value(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Option<Vec<_>>>()
            .map(PropertyValue::Multi),
        other => scalar(other).map(PropertyValue::Scalar),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
