//! Dependency evidence.

use serde::{Deserialize, Serialize};

use super::impl_evidence;
use crate::ontology::nodes::Package;
use crate::ontology::{EdgeKind, NodeId};

/// How a dependency was introduced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Direct,
    Indirect,
    #[default]
    Unknown,
}

/// `package` (a version) depends on `dependency_package` (usually name level)
/// within `version_range`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsDependency {
    pub id: NodeId,
    pub package: Package,
    pub dependency_package: Package,
    pub version_range: String,
    pub dependency_type: DependencyType,
    pub justification: String,
    pub origin: String,
    pub collector: String,
}

impl_evidence!(IsDependency, EdgeKind::IsDependency, justification, |r| vec![
    r.package.leaf_id().clone(),
    r.dependency_package.leaf_id().clone(),
]);
