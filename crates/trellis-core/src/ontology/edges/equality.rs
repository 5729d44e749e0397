//! Equality evidence.
//!
//! A single record asserts equality in both directions. No mirrored record
//! is stored and no transitive closure is materialized.

use serde::{Deserialize, Serialize};

use super::impl_evidence;
use crate::ontology::nodes::{Artifact, Package};
use crate::ontology::{EdgeKind, NodeId};

/// Two artifacts with different digests hold the same content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashEqual {
    pub id: NodeId,
    pub artifacts: Vec<Artifact>,
    pub justification: String,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(HashEqual, EdgeKind::HashEqual, justification, |r| r
    .artifacts
    .iter()
    .map(|a| a.id.clone())
    .collect());

/// Two package versions are the same software.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PkgEqual {
    pub id: NodeId,
    pub packages: Vec<Package>,
    pub justification: String,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(PkgEqual, EdgeKind::PkgEqual, justification, |r| r
    .packages
    .iter()
    .map(|p| p.leaf_id().clone())
    .collect());

impl HashEqual {
    /// The artifact on the other side of the record from `id`.
    pub fn other_side(&self, id: &NodeId) -> Option<&NodeId> {
        other_of(self.artifacts.iter().map(|a| &a.id), id)
    }
}

impl PkgEqual {
    /// The package on the other side of the record from `id`.
    pub fn other_side(&self, id: &NodeId) -> Option<&NodeId> {
        other_of(self.packages.iter().map(|p| p.leaf_id()), id)
    }
}

fn other_of<'a>(mut ids: impl Iterator<Item = &'a NodeId>, id: &NodeId) -> Option<&'a NodeId> {
    let first = ids.next()?;
    let second = ids.next()?;
    if first == id {
        Some(second)
    } else if second == id {
        Some(first)
    } else {
        None
    }
}
