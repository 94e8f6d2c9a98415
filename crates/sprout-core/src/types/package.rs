//! Package references and dependency manifests.
//!
//! A package is always addressed as a pinned `(package, release, serverlist)`
//! triple; the same triple is used in manifests to declare dependencies.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SproutError, SproutResult};

/// Directory, relative to the installation root, packages ship their manifests in
pub const DEFAULT_MANIFEST_DIR: &str = "oswtools/resources/json/package";

/// One installable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageReference {
    /// Package name (e.g. "tools.main")
    pub package: String,
    /// Release label (e.g. "stable")
    pub release: String,
    /// Name of the server list the package is fetched from
    pub serverlist: String,
}

impl PackageReference {
    /// Create a new package reference
    pub fn new(
        package: impl Into<String>,
        release: impl Into<String>,
        serverlist: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            release: release.into(),
            serverlist: serverlist.into(),
        }
    }

    /// Dedup key, rendered as `serverlist#package#release`
    pub fn key(&self) -> String {
        format!("{}#{}#{}", self.serverlist, self.package, self.release)
    }

    /// `package-release`, the stem of the archive and manifest file names
    pub fn label(&self) -> String {
        format!("{}-{}", self.package, self.release)
    }

    /// Temporary archive file name under the installation root
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.label())
    }

    /// Manifest file name inside the manifest directory
    pub fn manifest_file_name(&self) -> String {
        format!("{}.json", self.label())
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// `required` section of a manifest
///
/// Publishers emit an object keyed by dependency name, but an empty section
/// is serialized as `[]`, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredPackages {
    /// Keyed by an arbitrary dependency label
    Keyed(IndexMap<String, PackageReference>),
    /// Plain array
    Sequence(Vec<PackageReference>),
}

impl Default for RequiredPackages {
    fn default() -> Self {
        RequiredPackages::Sequence(Vec::new())
    }
}

/// Per-release metadata shipped inside a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    /// Packages this release requires
    #[serde(default)]
    pub required: Option<RequiredPackages>,
}

impl DependencyManifest {
    /// Decode a manifest document
    pub fn from_json(json: &str) -> SproutResult<Self> {
        serde_json::from_str(json).map_err(|e| SproutError::json("dependency manifest", &e))
    }

    /// Declared dependencies in manifest order
    pub fn dependencies(&self) -> Vec<&PackageReference> {
        match &self.required {
            Some(RequiredPackages::Keyed(map)) => map.values().collect(),
            Some(RequiredPackages::Sequence(list)) => list.iter().collect(),
            None => Vec::new(),
        }
    }
}
