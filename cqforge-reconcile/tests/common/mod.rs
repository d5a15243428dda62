//! In-memory stand-in for a content repository's HTTP API.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use cqforge_core::{Credentials, NodePath, PropertySet, PropertyValue};
use cqforge_http::{HttpResponse, Transport, TransportError};
use cqforge_reconcile::Session;
use serde_json::{json, Map, Value};

/// One request seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(String),
    Post(String, Vec<(String, String)>),
}

/// Serves `GET {path}.json`, node type descriptors, and multipart writes
/// the way the Sling POST servlet does, stamping `jcr:lastModified` on every
/// write.
#[derive(Debug, Default)]
pub struct FakeRepository {
    nodes: RefCell<BTreeMap<String, PropertySet>>,
    node_types: BTreeMap<String, Vec<String>>,
    raw_bodies: BTreeMap<String, String>,
    write_status: Option<(u16, String)>,
    requests: RefCell<Vec<Request>>,
    writes: RefCell<u64>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(self, path: &str, props: PropertySet) -> Self {
        self.nodes.borrow_mut().insert(path.to_owned(), props);
        self
    }

    pub fn with_node_type(mut self, name: &str, protected: &[&str]) -> Self {
        self.node_types.insert(
            name.to_owned(),
            protected.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Answer `GET {path}` with a 200 and this exact body.
    pub fn with_raw_body(mut self, path: &str, body: &str) -> Self {
        self.raw_bodies.insert(path.to_owned(), body.to_owned());
        self
    }

    /// Answer every write with this status and body instead of applying it.
    pub fn rejecting_writes(mut self, status: u16, body: &str) -> Self {
        self.write_status = Some((status, body.to_owned()));
        self
    }

    pub fn node(&self, path: &str) -> Option<PropertySet> {
        self.nodes.borrow().get(path).cloned()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Post(path, form) => Some((path.clone(), form.clone())),
                Request::Get(_) => None,
            })
            .collect()
    }

    pub fn schema_lookups(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| matches!(r, Request::Get(p) if p.starts_with("/jcr:system/jcr:nodeTypes/")))
            .count()
    }

    pub fn session(&self) -> Session<&FakeRepository> {
        Session::new(self, Credentials::new("admin", "admin"), None)
    }

    fn render_node(props: &PropertySet) -> String {
        let mut map = Map::new();
        for (name, value) in props {
            let v = match value {
                PropertyValue::Scalar(s) => Value::String(s.clone()),
                PropertyValue::Multi(items) => {
                    Value::Array(items.iter().cloned().map(Value::String).collect())
                }
            };
            map.insert(name.clone(), v);
        }
        Value::Object(map).to_string()
    }

    fn apply_form(&self, path: &str, form: &[(String, String)]) {
        let mut nodes = self.nodes.borrow_mut();
        if form.iter().any(|(k, v)| k == ":operation" && v == "delete") {
            nodes.remove(path);
            return;
        }

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut multi: BTreeSet<String> = BTreeSet::new();
        for (name, value) in form {
            if let Some(target) = name.strip_suffix("@TypeHint") {
                if value.ends_with("[]") {
                    multi.insert(target.to_owned());
                }
                continue;
            }
            grouped.entry(name.clone()).or_default().push(value.clone());
        }

        // Like the POST servlet: a name without values is not written, and
        // one value is stored single-valued unless hinted otherwise.
        let node = nodes.entry(path.to_owned()).or_default();
        for (name, mut values) in grouped {
            if let Some(target) = name.strip_suffix("@Delete") {
                node.remove(target);
            } else if values.len() == 1 && !multi.contains(&name) {
                node.insert(name, values.remove(0));
            } else {
                node.insert(name, PropertyValue::Multi(values));
            }
        }

        let mut writes = self.writes.borrow_mut();
        *writes += 1;
        node.insert("jcr:lastModified", format!("t{writes}"));
        node.insert("jcr:lastModifiedBy", "admin");
    }
}

impl Transport for FakeRepository {
    fn get(
        &self,
        path: &str,
        _auth: &Credentials,
        _deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(Request::Get(path.to_owned()));

        if let Some(body) = self.raw_bodies.get(path) {
            return Ok(HttpResponse::new(200, body.clone()));
        }

        if let Some(type_name) = path
            .strip_prefix("/jcr:system/jcr:nodeTypes/")
            .and_then(|p| p.strip_suffix(".json"))
        {
            return Ok(match self.node_types.get(type_name) {
                Some(protected) => HttpResponse::new(
                    200,
                    json!({ "jcr:primaryType": "nt:nodeType", "rep:protectedProperties": protected })
                        .to_string(),
                ),
                None => HttpResponse::new(404, "No resource found"),
            });
        }

        let node_path = path.strip_suffix(".json").unwrap_or(path);
        Ok(match self.nodes.borrow().get(node_path) {
            Some(props) => HttpResponse::new(200, Self::render_node(props)),
            None => HttpResponse::new(404, "No resource found"),
        })
    }

    fn multipart_post(
        &self,
        path: &str,
        _auth: &Credentials,
        form: &[(String, String)],
        _deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        self.requests
            .borrow_mut()
            .push(Request::Post(path.to_owned(), form.to_vec()));

        if let Some((status, body)) = &self.write_status {
            return Ok(HttpResponse::new(*status, body.clone()));
        }
        self.apply_form(path, form);
        Ok(HttpResponse::new(200, "<html>Content modified</html>"))
    }
}

pub fn props(pairs: &[(&str, &str)]) -> PropertySet {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn path(p: &str) -> NodePath {
    NodePath::new(p).expect("non-empty path")
}
