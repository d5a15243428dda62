//! Diff Engine: property-level delta between actual and desired state.
//!
//! All functions here are pure. The caller fetches the protected set (only
//! when the raw delta is non-empty) and passes it in.

use std::collections::BTreeSet;

use cqforge_core::{Delta, Policy, PropertySet};

use crate::schema::ProtectedProperties;

/// Timestamp/author properties the write API maintains on its own.
///
/// Sling documents the `jcr:` variants; CQ actually writes the `cq:` ones.
pub const AUTO_PROPERTIES: [&str; 6] = [
    "jcr:created",
    "jcr:createdBy",
    "jcr:lastModified",
    "jcr:lastModifiedBy",
    "cq:lastModified",
    "cq:lastModifiedBy",
];

pub fn is_auto_property(name: &str) -> bool {
    AUTO_PROPERTIES.contains(&name)
}

/// Whether a change to `name` may be sent at all.
pub fn is_editable(name: &str, protected: &ProtectedProperties) -> bool {
    !is_auto_property(name) && !protected.contains(name)
}

/// Merge policy: walk the union of current and desired keys; the effective
/// value is the desired one when declared, else the current one. Keep keys
/// whose effective value differs from current. Never deletes.
pub fn regular_diff(current: &PropertySet, desired: &PropertySet) -> Delta {
    let keys: BTreeSet<&String> = current.keys().chain(desired.keys()).collect();

    let mut delta = Delta::new();
    for key in keys {
        let Some(effective) = desired.get(key).or_else(|| current.get(key)) else {
            continue;
        };
        if current.get(key) != Some(effective) {
            delta.set(key.clone(), effective.clone());
        }
    }
    delta
}

/// Replace policy: set every desired key whose value differs from current,
/// delete every current key the desired state does not declare.
pub fn force_replace_diff(current: &PropertySet, desired: &PropertySet) -> Delta {
    let mut delta = Delta::new();
    for (key, value) in desired {
        if current.get(key) != Some(value) {
            delta.set(key.clone(), value.clone());
        }
    }
    for key in current.keys() {
        if !desired.contains(key) {
            delta.delete(key.clone());
        }
    }
    delta
}

/// Unfiltered delta under `policy`.
pub fn raw_diff(policy: Policy, current: &PropertySet, desired: &PropertySet) -> Delta {
    match policy {
        Policy::Merge => regular_diff(current, desired),
        Policy::Replace => force_replace_diff(current, desired),
    }
}

/// Primary type used for the protected-property lookup: desired first,
/// then current, else unknown.
pub fn resolve_primary_type<'a>(
    desired: &'a PropertySet,
    current: &'a PropertySet,
) -> Option<&'a str> {
    desired.primary_type().or_else(|| current.primary_type())
}

/// Drop auto-generated and protected properties from `delta`, deletions included.
pub fn filter_editable(delta: &mut Delta, protected: &ProtectedProperties) {
    delta.retain(|name| is_editable(name, protected));
}

/// Filtered delta: [`raw_diff`] followed by [`filter_editable`].
pub fn properties_diff(
    policy: Policy,
    current: &PropertySet,
    desired: &PropertySet,
    protected: &ProtectedProperties,
) -> Delta {
    let mut delta = raw_diff(policy, current, desired);
    filter_editable(&mut delta, protected);
    delta
}

#[cfg(test)]
mod tests {
    use cqforge_core::{Change, PropertyValue};
    use pretty_assertions::assert_eq;

    use super::*;

    fn props(pairs: &[(&str, &str)]) -> PropertySet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn none() -> ProtectedProperties {
        ProtectedProperties::new()
    }

    #[test]
    fn merge_with_no_changes_is_empty() {
        let current = props(&[("title", "Hello"), ("jcr:lastModified", "t0")]);
        let desired = props(&[("title", "Hello")]);
        assert!(properties_diff(Policy::Merge, &current, &desired, &none()).is_empty());
    }

    #[test]
    fn merge_updates_changed_and_adds_new() {
        let current = props(&[("title", "Hello"), ("keep", "me")]);
        let desired = props(&[("title", "World"), ("extra", "1")]);
        let delta = regular_diff(&current, &desired);
        assert_eq!(delta.len(), 2);
        assert_eq!(delta.get("title"), Some(&Change::Set("World".into())));
        assert_eq!(delta.get("extra"), Some(&Change::Set("1".into())));
        assert_eq!(delta.get("keep"), None);
    }

    #[test]
    fn replace_sets_and_deletes() {
        let current = props(&[("title", "Hello"), ("subtitle", "Old")]);
        let desired = props(&[("title", "World")]);
        let delta = properties_diff(Policy::Replace, &current, &desired, &none());
        assert_eq!(
            delta.form_fields(),
            vec![
                ("subtitle@Delete".to_string(), String::new()),
                ("title".to_string(), "World".to_string()),
            ]
        );
    }

    #[test]
    fn replace_never_deletes_auto_properties() {
        let current = props(&[
            ("title", "Hello"),
            ("jcr:created", "t0"),
            ("cq:lastModifiedBy", "admin"),
        ]);
        let desired = props(&[("title", "Hello")]);
        assert!(properties_diff(Policy::Replace, &current, &desired, &none()).is_empty());
    }

    #[test]
    fn protected_properties_are_dropped_from_sets_and_deletes() {
        let protected: ProtectedProperties =
            ["jcr:uuid".to_string(), "jcr:mixinTypes".to_string()].into();
        let current = props(&[("jcr:uuid", "abc"), ("title", "a")]);
        let desired = props(&[("jcr:mixinTypes", "mix:versionable"), ("title", "b")]);
        let delta = properties_diff(Policy::Replace, &current, &desired, &protected);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("title"), Some(&Change::Set("b".into())));
    }

    #[test]
    fn primary_type_prefers_desired_then_current() {
        let desired = props(&[("jcr:primaryType", "cq:Page")]);
        let current = props(&[("jcr:primaryType", "nt:unstructured")]);
        assert_eq!(resolve_primary_type(&desired, &current), Some("cq:Page"));
        assert_eq!(
            resolve_primary_type(&PropertySet::new(), &current),
            Some("nt:unstructured")
        );
        assert_eq!(resolve_primary_type(&PropertySet::new(), &PropertySet::new()), None);
    }

    #[test]
    fn multi_value_order_matters() {
        let mut current = PropertySet::new();
        current.insert("tags", PropertyValue::Multi(vec!["a".into(), "b".into()]));
        let mut desired = PropertySet::new();
        desired.insert("tags", PropertyValue::Multi(vec!["b".into(), "a".into()]));
        assert_eq!(regular_diff(&current, &desired).len(), 1);
    }

    #[test]
    fn auto_property_set_has_six_names() {
        assert_eq!(AUTO_PROPERTIES.len(), 6);
        assert!(is_auto_property("cq:lastModified"));
        assert!(!is_auto_property("jcr:primaryType"));
    }
}
