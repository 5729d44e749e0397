//! Supply-chain graph ontology.
//!
//! Defines the closed set of node and evidence kinds the graph stores, and
//! the unified [`GraphNode`] union every lookup returns.
//!
//! ## Modules
//!
//! - `nodes/` - Entities: Package, Source (hierarchical), Artifact, Builder,
//!   Vulnerability, License (flat)
//! - `edges/` - Evidence records: dependency, equality, attestation and
//!   certification kinds
//!
//! Evidence records are nodes too. They carry their own id and embed trimmed
//! trees of the subjects they are attached to.

pub mod edges;
pub mod nodes;

pub use edges::*;
pub use nodes::*;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTIFIERS AND KINDS
// =============================================================================

/// Opaque, globally unique node identifier assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entity node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Package,
    Source,
    Artifact,
    Builder,
    Vulnerability,
    License,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Source => "source",
            Self::Artifact => "artifact",
            Self::Builder => "builder",
            Self::Vulnerability => "vulnerability",
            Self::License => "license",
        }
    }
}

/// Evidence kinds. The neighbor bundle has one bucket per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    IsDependency,
    IsOccurrence,
    HashEqual,
    PkgEqual,
    HasSourceAt,
    HasSbom,
    HasSlsa,
    CertifyVuln,
    CertifyVexStatement,
    CertifyBad,
    CertifyGood,
    CertifyScorecard,
    CertifyLegal,
}

impl EdgeKind {
    /// Every kind, in bucket order.
    pub const ALL: [EdgeKind; 13] = [
        EdgeKind::IsDependency,
        EdgeKind::IsOccurrence,
        EdgeKind::HashEqual,
        EdgeKind::PkgEqual,
        EdgeKind::HasSourceAt,
        EdgeKind::HasSbom,
        EdgeKind::HasSlsa,
        EdgeKind::CertifyVuln,
        EdgeKind::CertifyVexStatement,
        EdgeKind::CertifyBad,
        EdgeKind::CertifyGood,
        EdgeKind::CertifyScorecard,
        EdgeKind::CertifyLegal,
    ];

    /// Stable snake_case name, used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsDependency => "is_dependency",
            Self::IsOccurrence => "is_occurrence",
            Self::HashEqual => "hash_equal",
            Self::PkgEqual => "pkg_equal",
            Self::HasSourceAt => "has_source_at",
            Self::HasSbom => "has_sbom",
            Self::HasSlsa => "has_slsa",
            Self::CertifyVuln => "certify_vuln",
            Self::CertifyVexStatement => "certify_vex_statement",
            Self::CertifyBad => "certify_bad",
            Self::CertifyGood => "certify_good",
            Self::CertifyScorecard => "certify_scorecard",
            Self::CertifyLegal => "certify_legal",
        }
    }

    /// Human-readable name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::IsDependency => "IsDependency",
            Self::IsOccurrence => "IsOccurrence",
            Self::HashEqual => "HashEqual",
            Self::PkgEqual => "PkgEqual",
            Self::HasSourceAt => "HasSourceAt",
            Self::HasSbom => "HasSBOM",
            Self::HasSlsa => "HasSLSA",
            Self::CertifyVuln => "CertifyVuln",
            Self::CertifyVexStatement => "CertifyVEXStatement",
            Self::CertifyBad => "CertifyBad",
            Self::CertifyGood => "CertifyGood",
            Self::CertifyScorecard => "CertifyScorecard",
            Self::CertifyLegal => "CertifyLegal",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

impl std::str::FromStr for EdgeKind {
    type Err = String;

    /// Accepts the snake_case name, the display name, or the short link
    /// names used by the visualizer (`occurrence`, `hasSrcAt`, `vexLink`...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace(['-', '_'], "").to_lowercase();
        let kind = match normalized.as_str() {
            "isdependency" | "dependency" => Self::IsDependency,
            "isoccurrence" | "occurrence" => Self::IsOccurrence,
            "hashequal" => Self::HashEqual,
            "pkgequal" => Self::PkgEqual,
            "hassourceat" | "hassrcat" => Self::HasSourceAt,
            "hassbom" => Self::HasSbom,
            "hasslsa" => Self::HasSlsa,
            "certifyvuln" => Self::CertifyVuln,
            "certifyvexstatement" | "vexlink" => Self::CertifyVexStatement,
            "certifybad" | "badlink" => Self::CertifyBad,
            "certifygood" | "goodlink" => Self::CertifyGood,
            "certifyscorecard" | "scorecard" => Self::CertifyScorecard,
            "certifylegal" => Self::CertifyLegal,
            _ => return Err(format!("unknown evidence kind: {}", s)),
        };
        Ok(kind)
    }
}

/// Allow-list of evidence kinds. Empty means every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFilter {
    kinds: Vec<EdgeKind>,
}

impl EdgeFilter {
    /// Allow every kind, hierarchy links included.
    pub fn all() -> Self {
        Self::default()
    }

    /// Allow only the given kinds. An empty list allows every kind.
    pub fn only(kinds: impl IntoIterator<Item = EdgeKind>) -> Self {
        let mut kinds: Vec<EdgeKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        Self { kinds }
    }

    pub fn single(kind: EdgeKind) -> Self {
        Self { kinds: vec![kind] }
    }

    pub fn is_all(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn allows(&self, kind: EdgeKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    /// The allowed kinds, expanded to the full set when unrestricted.
    pub fn kinds(&self) -> Vec<EdgeKind> {
        if self.kinds.is_empty() {
            EdgeKind::ALL.to_vec()
        } else {
            self.kinds.clone()
        }
    }
}

/// Categories of nodes for filtering and organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Packages, sources, artifacts, builders, vulnerabilities, licenses
    Entity,
    /// Evidence records
    Evidence,
    /// A kind this build does not know
    Unrecognized,
}

// =============================================================================
// UNIFIED NODE
// =============================================================================

/// A unified node type that can represent any node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type")]
pub enum GraphNode {
    // === Entities ===
    Package(Package),
    Source(Source),
    Artifact(Artifact),
    Builder(Builder),
    Vulnerability(Vulnerability),
    License(License),

    // === Evidence ===
    IsDependency(IsDependency),
    IsOccurrence(IsOccurrence),
    HashEqual(HashEqual),
    PkgEqual(PkgEqual),
    HasSourceAt(HasSourceAt),
    #[serde(rename = "HasSBOM")]
    HasSbom(HasSbom),
    #[serde(rename = "HasSLSA")]
    HasSlsa(HasSlsa),
    CertifyVuln(CertifyVuln),
    #[serde(rename = "CertifyVEXStatement")]
    CertifyVexStatement(CertifyVexStatement),
    CertifyBad(CertifyBad),
    CertifyGood(CertifyGood),
    CertifyScorecard(CertifyScorecard),
    CertifyLegal(CertifyLegal),

    /// Any node kind this build does not know; skipped by every consumer.
    #[serde(other)]
    Unrecognized,
}

impl GraphNode {
    /// Get the node id, if the node kind is known.
    pub fn id(&self) -> Option<&NodeId> {
        match self {
            Self::Package(n) => Some(&n.id),
            Self::Source(n) => Some(&n.id),
            Self::Artifact(n) => Some(&n.id),
            Self::Builder(n) => Some(&n.id),
            Self::Vulnerability(n) => Some(&n.id),
            Self::License(n) => Some(&n.id),
            Self::Unrecognized => None,
            _ => self.as_evidence().map(|e| e.id()),
        }
    }

    /// Id of the addressed node. For trimmed trees this is the deepest
    /// level, not the root.
    pub fn leaf_id(&self) -> Option<&NodeId> {
        match self {
            Self::Package(p) => Some(p.leaf_id()),
            Self::Source(s) => Some(s.leaf_id()),
            other => other.id(),
        }
    }

    /// Get the type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Package(_) => "Package",
            Self::Source(_) => "Source",
            Self::Artifact(_) => "Artifact",
            Self::Builder(_) => "Builder",
            Self::Vulnerability(_) => "Vulnerability",
            Self::License(_) => "License",
            Self::Unrecognized => "Unrecognized",
            _ => self.edge_kind().map(|k| k.type_name()).unwrap_or("Unrecognized"),
        }
    }

    /// Get the category of this node.
    pub fn category(&self) -> NodeCategory {
        if self.entity_kind().is_some() {
            NodeCategory::Entity
        } else if self.edge_kind().is_some() {
            NodeCategory::Evidence
        } else {
            NodeCategory::Unrecognized
        }
    }

    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::Package(_) => Some(EntityKind::Package),
            Self::Source(_) => Some(EntityKind::Source),
            Self::Artifact(_) => Some(EntityKind::Artifact),
            Self::Builder(_) => Some(EntityKind::Builder),
            Self::Vulnerability(_) => Some(EntityKind::Vulnerability),
            Self::License(_) => Some(EntityKind::License),
            _ => None,
        }
    }

    pub fn edge_kind(&self) -> Option<EdgeKind> {
        self.as_evidence().map(|e| e.kind())
    }

    /// View an evidence node through the common [`Evidence`] surface.
    pub fn as_evidence(&self) -> Option<&dyn Evidence> {
        match self {
            Self::IsDependency(e) => Some(e),
            Self::IsOccurrence(e) => Some(e),
            Self::HashEqual(e) => Some(e),
            Self::PkgEqual(e) => Some(e),
            Self::HasSourceAt(e) => Some(e),
            Self::HasSbom(e) => Some(e),
            Self::HasSlsa(e) => Some(e),
            Self::CertifyVuln(e) => Some(e),
            Self::CertifyVexStatement(e) => Some(e),
            Self::CertifyBad(e) => Some(e),
            Self::CertifyGood(e) => Some(e),
            Self::CertifyScorecard(e) => Some(e),
            Self::CertifyLegal(e) => Some(e),
            Self::Package(_)
            | Self::Source(_)
            | Self::Artifact(_)
            | Self::Builder(_)
            | Self::Vulnerability(_)
            | Self::License(_)
            | Self::Unrecognized => None,
        }
    }

    /// Ids this evidence node is attached to; empty for entities.
    pub fn subject_ids(&self) -> Vec<NodeId> {
        self.as_evidence().map(|e| e.subject_ids()).unwrap_or_default()
    }

    /// Replace the id of an evidence node. Entities are left untouched since
    /// their ids come from the hierarchy.
    pub(crate) fn set_evidence_id(&mut self, id: NodeId) {
        match self {
            Self::IsDependency(e) => e.id = id,
            Self::IsOccurrence(e) => e.id = id,
            Self::HashEqual(e) => e.id = id,
            Self::PkgEqual(e) => e.id = id,
            Self::HasSourceAt(e) => e.id = id,
            Self::HasSbom(e) => e.id = id,
            Self::HasSlsa(e) => e.id = id,
            Self::CertifyVuln(e) => e.id = id,
            Self::CertifyVexStatement(e) => e.id = id,
            Self::CertifyBad(e) => e.id = id,
            Self::CertifyGood(e) => e.id = id,
            Self::CertifyScorecard(e) => e.id = id,
            Self::CertifyLegal(e) => e.id = id,
            Self::Package(_)
            | Self::Source(_)
            | Self::Artifact(_)
            | Self::Builder(_)
            | Self::Vulnerability(_)
            | Self::License(_)
            | Self::Unrecognized => {}
        }
    }
}

macro_rules! graph_node_from {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for GraphNode {
                fn from(node: $ty) -> Self {
                    GraphNode::$ty(node)
                }
            }
        )*
    };
}

graph_node_from!(
    Package,
    Source,
    Artifact,
    Builder,
    Vulnerability,
    License,
    IsDependency,
    IsOccurrence,
    HashEqual,
    PkgEqual,
    HasSourceAt,
    HasSbom,
    HasSlsa,
    CertifyVuln,
    CertifyVexStatement,
    CertifyBad,
    CertifyGood,
    CertifyScorecard,
    CertifyLegal,
);
