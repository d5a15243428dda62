//! Domain types for node-state reconciliation.
//!
//! Desired and actual state are plain values built once per reconciliation
//! pass. Nothing here performs I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EmptyNodePath;

/// Name of the property holding a node's primary type.
pub const PRIMARY_TYPE: &str = "jcr:primaryType";

/// Suffix that turns a form field into a deletion marker for the write API.
pub const DELETE_SUFFIX: &str = "@Delete";

/// Suffix of the field that fixes a property's stored type.
pub const TYPE_HINT_SUFFIX: &str = "@TypeHint";

/// Type hint that keeps a one-element list multi-valued on write.
pub const MULTI_STRING_HINT: &str = "String[]";

/// Form fields for a multipart write, in emission order.
pub type FormFields = Vec<(String, String)>;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Path of a node in the remote content hierarchy. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    pub fn new(path: impl Into<String>) -> Result<Self, EmptyNodePath> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(EmptyNodePath);
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the structured (`.json`) representation of this node.
    pub fn json_path(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for NodePath {
    type Error = EmptyNodePath;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for NodePath {
    type Error = EmptyNodePath;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodePath> for String {
    fn from(p: NodePath) -> Self {
        p.0
    }
}

// ---------------------------------------------------------------------------
// Property values
// ---------------------------------------------------------------------------

/// A property value as carried on the wire.
///
/// Booleans and numbers are normalised to their string form so that a
/// desired `true` compares equal to a remote `"true"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawValue")]
pub enum PropertyValue {
    Scalar(String),
    Multi(Vec<String>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            PropertyValue::Multi(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(s) => write!(f, "{s:?}"),
            PropertyValue::Multi(values) => write!(f, "{values:?}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Scalar(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Scalar(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Scalar(b.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        PropertyValue::Multi(values)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawScalar> for String {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Bool(b) => b.to_string(),
            RawScalar::Int(i) => i.to_string(),
            RawScalar::Float(x) => x.to_string(),
            RawScalar::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    One(RawScalar),
    Many(Vec<RawScalar>),
}

impl From<RawValue> for PropertyValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::One(s) => PropertyValue::Scalar(s.into()),
            RawValue::Many(items) => {
                PropertyValue::Multi(items.into_iter().map(String::from).collect())
            }
        }
    }
}

/// Property name → value. Ordered so every rendering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, PropertyValue>);

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The declared `jcr:primaryType`, if present and non-empty.
    pub fn primary_type(&self) -> Option<&str> {
        self.get(PRIMARY_TYPE)
            .and_then(PropertyValue::as_scalar)
            .filter(|t| !t.is_empty())
    }

    /// Encode every property as multipart form fields.
    ///
    /// Multi-valued properties send a `String[]` type hint, then repeat the
    /// field name once per value.
    pub fn form_fields(&self) -> FormFields {
        let mut fields = Vec::with_capacity(self.len());
        for (name, value) in &self.0 {
            push_value(&mut fields, name, value);
        }
        fields
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn push_value(fields: &mut FormFields, name: &str, value: &PropertyValue) {
    match value {
        PropertyValue::Scalar(s) => fields.push((name.to_owned(), s.clone())),
        PropertyValue::Multi(values) => {
            fields.push((
                format!("{name}{TYPE_HINT_SUFFIX}"),
                MULTI_STRING_HINT.to_owned(),
            ));
            for v in values {
                fields.push((name.to_owned(), v.clone()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// One property-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Set(PropertyValue),
    Delete,
}

/// The property writes and deletions that move a node to its desired state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta(BTreeMap<String, Change>);

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), Change::Set(value));
    }

    pub fn delete(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), Change::Delete);
    }

    pub fn get(&self, name: &str) -> Option<&Change> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.0.iter()
    }

    /// Keep only the changes whose property name satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|name, _| keep(name));
    }

    /// Wire form: `name=value` for sets, `name@Delete=""` for deletions.
    pub fn form_fields(&self) -> FormFields {
        let mut fields = Vec::with_capacity(self.len());
        for (name, change) in &self.0 {
            match change {
                Change::Set(value) => push_value(&mut fields, name, value),
                Change::Delete => fields.push((format!("{name}{DELETE_SUFFIX}"), String::new())),
            }
        }
        fields
    }

    /// Apply this delta to `properties`, returning the resulting state.
    pub fn apply_to(&self, properties: &PropertySet) -> PropertySet {
        let mut result = properties.clone();
        for (name, change) in &self.0 {
            match change {
                Change::Set(value) => result.insert(name.clone(), value.clone()),
                Change::Delete => {
                    result.remove(name);
                }
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How desired properties are reconciled against the current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Update differing properties, never delete extras.
    Merge,
    /// Make the node's properties exactly the desired set.
    Replace,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Merge => write!(f, "merge"),
            Policy::Replace => write!(f, "replace"),
        }
    }
}

/// Caller-invoked action for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Create,
    Delete,
    Modify,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Delete => write!(f, "delete"),
            Action::Modify => write!(f, "modify"),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What the caller wants a node to look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub path: NodePath,
    pub properties: PropertySet,
    pub policy: Policy,
}

/// What the remote system reported at the start of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualState {
    pub path: NodePath,
    pub exists: bool,
    pub properties: PropertySet,
}

impl ActualState {
    pub fn absent(path: NodePath) -> Self {
        Self {
            path,
            exists: false,
            properties: PropertySet::new(),
        }
    }
}

/// Basic-auth credentials for the content API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_rejects_empty() {
        assert!(NodePath::new("").is_err());
        assert!(NodePath::new("   ").is_err());
        assert_eq!(NodePath::new("/content").unwrap().as_str(), "/content");
    }

    #[test]
    fn node_path_json_path() {
        let p = NodePath::new("/content/site").unwrap();
        assert_eq!(p.json_path(), "/content/site.json");
    }

    #[test]
    fn yaml_scalars_normalise_to_strings() {
        let props: PropertySet =
            serde_yaml::from_str("enabled: true\ncount: 3\nratio: 0.5\ntitle: Hello\n")
                .expect("parse");
        assert_eq!(props.get("enabled"), Some(&PropertyValue::from("true")));
        assert_eq!(props.get("count"), Some(&PropertyValue::from("3")));
        assert_eq!(props.get("ratio"), Some(&PropertyValue::from("0.5")));
        assert_eq!(props.get("title"), Some(&PropertyValue::from("Hello")));
    }

    #[test]
    fn yaml_lists_become_multi_values() {
        let props: PropertySet = serde_yaml::from_str("tags: [a, b, 3]\n").expect("parse");
        assert_eq!(
            props.get("tags"),
            Some(&PropertyValue::Multi(vec![
                "a".to_string(),
                "b".to_string(),
                "3".to_string()
            ]))
        );
    }

    #[test]
    fn primary_type_ignores_empty_and_multi() {
        let mut props = PropertySet::new();
        assert_eq!(props.primary_type(), None);
        props.insert(PRIMARY_TYPE, "");
        assert_eq!(props.primary_type(), None);
        props.insert(PRIMARY_TYPE, "nt:unstructured");
        assert_eq!(props.primary_type(), Some("nt:unstructured"));
    }

    #[test]
    fn delta_form_fields_mark_deletions() {
        let mut delta = Delta::new();
        delta.set("title", "World".into());
        delta.delete("subtitle");
        assert_eq!(
            delta.form_fields(),
            vec![
                ("subtitle@Delete".to_string(), String::new()),
                ("title".to_string(), "World".to_string()),
            ]
        );
    }

    #[test]
    fn multi_values_send_type_hint_and_repeat_field_name() {
        let props: PropertySet =
            [("tags", PropertyValue::Multi(vec!["a".into(), "b".into()]))]
                .into_iter()
                .collect();
        assert_eq!(
            props.form_fields(),
            vec![
                ("tags@TypeHint".to_string(), "String[]".to_string()),
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn single_element_list_stays_multi_valued_on_the_wire() {
        let mut delta = Delta::new();
        delta.set("tags", PropertyValue::Multi(vec!["a".into()]));
        assert_eq!(
            delta.form_fields(),
            vec![
                ("tags@TypeHint".to_string(), "String[]".to_string()),
                ("tags".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn delta_apply_sets_and_removes() {
        let current: PropertySet = [("a", "1"), ("b", "2")].into_iter().collect();
        let mut delta = Delta::new();
        delta.set("a", "9".into());
        delta.delete("b");
        let expected: PropertySet = [("a", "9")].into_iter().collect();
        assert_eq!(delta.apply_to(&current), expected);
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("admin", "s3cret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn policy_and_action_display() {
        assert_eq!(Policy::Replace.to_string(), "replace");
        assert_eq!(Action::Modify.to_string(), "modify");
        assert_eq!(Action::default(), Action::Create);
    }
}
