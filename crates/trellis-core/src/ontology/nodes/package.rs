//! Package nodes: type → namespace → name → version.
//!
//! Packages travel as trimmed trees. A tree returned for a single subject
//! holds exactly one branch down to the addressed level; trees returned by
//! spec lookups may hold many branches.

use serde::{Deserialize, Serialize};

use crate::identity::PackageCoordinate;
use crate::ontology::NodeId;

// =============================================================================
// TREE LEVELS
// =============================================================================

/// One `key=value` qualifier on a package version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageQualifier {
    pub key: String,
    pub value: String,
}

impl PackageQualifier {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Version level: the leaf of a package tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub id: NodeId,
    /// Empty when the coordinate carried no version.
    pub version: String,
    /// Empty when the coordinate carried no subpath.
    pub subpath: String,
    /// Sorted by key.
    pub qualifiers: Vec<PackageQualifier>,
}

/// Name level; groups versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageName {
    pub id: NodeId,
    pub name: String,
    pub versions: Vec<PackageVersion>,
}

/// Namespace level; groups names. The namespace string may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNamespace {
    pub id: NodeId,
    pub namespace: String,
    pub names: Vec<PackageName>,
}

/// Type level; the root of a package tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub pkg_type: String,
    pub namespaces: Vec<PackageNamespace>,
}

/// Depth of a package node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageLevel {
    Type,
    Namespace,
    Name,
    Version,
}

// =============================================================================
// FLATTENED VIEW
// =============================================================================

/// A single root-to-leaf branch of a package tree, flattened.
///
/// `chain` lists the ids from the leaf up to the type node, which is the
/// ancestry order the path builder expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLeaf {
    pub id: NodeId,
    pub level: PackageLevel,
    pub chain: Vec<NodeId>,
    pub pkg_type: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub subpath: Option<String>,
    pub qualifiers: Vec<PackageQualifier>,
}

impl PackageLeaf {
    /// Id of the name node on this branch, if the branch reaches it.
    pub fn name_id(&self) -> Option<&NodeId> {
        match self.level {
            PackageLevel::Version => self.chain.get(1),
            PackageLevel::Name => self.chain.first(),
            _ => None,
        }
    }

    /// Whether `id` names any node on this branch.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.chain.iter().any(|c| c == id)
    }
}

impl Package {
    /// Flatten into one leaf per branch, at the deepest level each branch
    /// reaches.
    pub fn leaves(&self) -> Vec<PackageLeaf> {
        let mut out = Vec::new();
        let base = |level, id: &NodeId, chain: Vec<NodeId>| PackageLeaf {
            id: id.clone(),
            level,
            chain,
            pkg_type: self.pkg_type.clone(),
            namespace: None,
            name: None,
            version: None,
            subpath: None,
            qualifiers: Vec::new(),
        };

        if self.namespaces.is_empty() {
            out.push(base(PackageLevel::Type, &self.id, vec![self.id.clone()]));
        }
        for ns in &self.namespaces {
            if ns.names.is_empty() {
                let mut leaf = base(
                    PackageLevel::Namespace,
                    &ns.id,
                    vec![ns.id.clone(), self.id.clone()],
                );
                leaf.namespace = Some(ns.namespace.clone());
                out.push(leaf);
            }
            for name in &ns.names {
                if name.versions.is_empty() {
                    let mut leaf = base(
                        PackageLevel::Name,
                        &name.id,
                        vec![name.id.clone(), ns.id.clone(), self.id.clone()],
                    );
                    leaf.namespace = Some(ns.namespace.clone());
                    leaf.name = Some(name.name.clone());
                    out.push(leaf);
                }
                for v in &name.versions {
                    out.push(PackageLeaf {
                        id: v.id.clone(),
                        level: PackageLevel::Version,
                        chain: vec![v.id.clone(), name.id.clone(), ns.id.clone(), self.id.clone()],
                        pkg_type: self.pkg_type.clone(),
                        namespace: Some(ns.namespace.clone()),
                        name: Some(name.name.clone()),
                        version: Some(v.version.clone()),
                        subpath: Some(v.subpath.clone()),
                        qualifiers: v.qualifiers.clone(),
                    });
                }
            }
        }
        out
    }

    /// Id of the deepest node on the first branch.
    ///
    /// Evidence subjects are single-branch trees, so this is the id the
    /// evidence is attached to.
    pub fn leaf_id(&self) -> &NodeId {
        let Some(ns) = self.namespaces.first() else {
            return &self.id;
        };
        let Some(name) = ns.names.first() else {
            return &ns.id;
        };
        match name.versions.first() {
            Some(v) => &v.id,
            None => &name.id,
        }
    }

    /// Coordinate of the first branch, for display and purl encoding.
    pub fn coordinate(&self) -> PackageCoordinate {
        let ns = self.namespaces.first();
        let name = ns.and_then(|ns| ns.names.first());
        let version = name.and_then(|n| n.versions.first());
        PackageCoordinate {
            pkg_type: self.pkg_type.clone(),
            namespace: ns.map(|ns| ns.namespace.clone()).unwrap_or_default(),
            name: name.map(|n| n.name.clone()).unwrap_or_default(),
            version: version.map(|v| v.version.clone()).filter(|v| !v.is_empty()),
            subpath: version.map(|v| v.subpath.clone()).filter(|s| !s.is_empty()),
            qualifiers: version.map(|v| v.qualifiers.clone()).unwrap_or_default(),
        }
    }

    /// All node ids in the tree, root first.
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.id.clone()];
        for ns in &self.namespaces {
            ids.push(ns.id.clone());
            for name in &ns.names {
                ids.push(name.id.clone());
                ids.extend(name.versions.iter().map(|v| v.id.clone()));
            }
        }
        ids
    }
}
