//! YAML manifest: target instances and desired node state.
//!
//! # Storage layout
//!
//! ```text
//! ~/.cqforge/
//!   manifest.yaml
//! ```
//!
//! # API pattern
//!
//! - `load(path)`: explicit manifest file
//! - `load_at(home)`: `<home>/.cqforge/manifest.yaml`; used in tests with `TempDir`
//! - `load_default()`: derives home from `dirs::home_dir()`, delegates to `load_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::types::{
    Action, Credentials, DesiredState, NodePath, Policy, PropertySet, PropertyValue,
};

/// Default binary used to unpack the quickstart jar.
pub const DEFAULT_JAVA: &str = "java";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Root of the manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceConfig>,
    #[serde(default)]
    pub nodes: Vec<NodeDeclaration>,
}

/// Connection settings for one running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base URL, e.g. `http://localhost:4502`.
    pub url: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Environment variable holding the password; used when `password` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    /// Per-request deadline in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallSpec>,
}

impl InstanceConfig {
    /// Resolve credentials, reading `password_env` when no inline password is set.
    pub fn credentials(&self, instance: &str) -> Result<Credentials, ManifestError> {
        if let Some(password) = &self.password {
            return Ok(Credentials::new(&self.username, password));
        }
        let Some(var) = &self.password_env else {
            return Err(ManifestError::MissingPassword {
                instance: instance.to_owned(),
            });
        };
        let password = std::env::var(var).map_err(|_| ManifestError::PasswordEnv {
            instance: instance.to_owned(),
            var: var.clone(),
        })?;
        Ok(Credentials::new(&self.username, password))
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Where and what to provision for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Parent of all instance homes, e.g. `/opt/cq`.
    pub home_dir: PathBuf,
    /// Instance flavour (`author`, `publish`); names the instance home.
    pub mode: String,
    pub jar: Artifact,
    pub license: Artifact,
    #[serde(default = "default_java")]
    pub java: PathBuf,
}

impl InstallSpec {
    /// `<home_dir>/<mode>`
    pub fn instance_home(&self) -> PathBuf {
        self.home_dir.join(&self.mode)
    }
}

fn default_java() -> PathBuf {
    PathBuf::from(DEFAULT_JAVA)
}

/// A remote file with an optional SHA-256 checksum (hex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Desired state of one node on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDeclaration {
    pub path: NodePath,
    pub instance: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub properties: PropertySet,
}

impl NodeDeclaration {
    /// The desired state carried by this declaration.
    ///
    /// `None` when no policy is declared, which validation only allows for deletes.
    pub fn desired_state(&self) -> Option<DesiredState> {
        self.policy.map(|policy| DesiredState {
            path: self.path.clone(),
            properties: self.properties.clone(),
            policy,
        })
    }
}

impl Manifest {
    /// Parse and validate a manifest document. `origin` is used in error messages only.
    pub fn from_yaml(contents: &str, origin: &Path) -> Result<Self, ManifestError> {
        let manifest: Manifest =
            serde_yaml::from_str(contents).map_err(|e| ManifestError::Parse {
                path: origin.to_path_buf(),
                source: e,
            })?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    fn validate(&self, origin: &Path) -> Result<(), ManifestError> {
        for node in &self.nodes {
            if !self.instances.contains_key(&node.instance) {
                return Err(ManifestError::UnknownInstance {
                    path: origin.to_path_buf(),
                    node: node.path.to_string(),
                    instance: node.instance.clone(),
                });
            }
            if node.action != Action::Delete && node.policy.is_none() {
                return Err(ManifestError::MissingPolicy {
                    path: origin.to_path_buf(),
                    node: node.path.to_string(),
                });
            }
            // The write API stores nothing for an empty list.
            if let Some((property, _)) = node
                .properties
                .iter()
                .find(|(_, value)| matches!(value, PropertyValue::Multi(v) if v.is_empty()))
            {
                return Err(ManifestError::EmptyList {
                    path: origin.to_path_buf(),
                    node: node.path.to_string(),
                    property: property.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.get(name)
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.cqforge/manifest.yaml`: pure, no I/O.
pub fn manifest_path_at(home: &Path) -> PathBuf {
    home.join(".cqforge").join("manifest.yaml")
}

/// Load and validate the manifest at `path`.
///
/// Returns `ManifestError::NotFound` if absent,
/// `ManifestError::Parse` (with path + line context) if malformed YAML.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Manifest::from_yaml(&contents, path)
}

/// Load `<home>/.cqforge/manifest.yaml`.
pub fn load_at(home: &Path) -> Result<Manifest, ManifestError> {
    load(&manifest_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load_default() -> Result<Manifest, ManifestError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ManifestError> {
    dirs::home_dir().ok_or(ManifestError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
