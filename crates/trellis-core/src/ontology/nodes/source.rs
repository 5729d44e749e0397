//! Source nodes: type → namespace → name (+ tag / commit).

use serde::{Deserialize, Serialize};

use crate::identity::SourceCoordinate;
use crate::ontology::NodeId;

/// Name level of a source tree. Tag and commit discriminate names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceName {
    pub id: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// Namespace level, e.g. `github.com/guacsec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNamespace {
    pub id: NodeId,
    pub namespace: String,
    pub names: Vec<SourceName>,
}

/// Type level, e.g. `git`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub src_type: String,
    pub namespaces: Vec<SourceNamespace>,
}

/// Depth of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLevel {
    Type,
    Namespace,
    Name,
}

/// A single branch of a source tree, flattened. `chain` runs leaf → root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLeaf {
    pub id: NodeId,
    pub level: SourceLevel,
    pub chain: Vec<NodeId>,
    pub src_type: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

impl SourceLeaf {
    pub fn contains(&self, id: &NodeId) -> bool {
        self.chain.iter().any(|c| c == id)
    }
}

impl Source {
    pub fn leaves(&self) -> Vec<SourceLeaf> {
        let mut out = Vec::new();
        if self.namespaces.is_empty() {
            out.push(SourceLeaf {
                id: self.id.clone(),
                level: SourceLevel::Type,
                chain: vec![self.id.clone()],
                src_type: self.src_type.clone(),
                namespace: None,
                name: None,
                tag: None,
                commit: None,
            });
        }
        for ns in &self.namespaces {
            if ns.names.is_empty() {
                out.push(SourceLeaf {
                    id: ns.id.clone(),
                    level: SourceLevel::Namespace,
                    chain: vec![ns.id.clone(), self.id.clone()],
                    src_type: self.src_type.clone(),
                    namespace: Some(ns.namespace.clone()),
                    name: None,
                    tag: None,
                    commit: None,
                });
            }
            for name in &ns.names {
                out.push(SourceLeaf {
                    id: name.id.clone(),
                    level: SourceLevel::Name,
                    chain: vec![name.id.clone(), ns.id.clone(), self.id.clone()],
                    src_type: self.src_type.clone(),
                    namespace: Some(ns.namespace.clone()),
                    name: Some(name.name.clone()),
                    tag: name.tag.clone(),
                    commit: name.commit.clone(),
                });
            }
        }
        out
    }

    /// Id of the deepest node on the first branch.
    pub fn leaf_id(&self) -> &NodeId {
        let Some(ns) = self.namespaces.first() else {
            return &self.id;
        };
        match ns.names.first() {
            Some(name) => &name.id,
            None => &ns.id,
        }
    }

    pub fn coordinate(&self) -> SourceCoordinate {
        let ns = self.namespaces.first();
        let name = ns.and_then(|ns| ns.names.first());
        SourceCoordinate {
            src_type: self.src_type.clone(),
            namespace: ns.map(|ns| ns.namespace.clone()).unwrap_or_default(),
            name: name.map(|n| n.name.clone()).unwrap_or_default(),
            tag: name.and_then(|n| n.tag.clone()),
            commit: name.and_then(|n| n.commit.clone()),
        }
    }
}
