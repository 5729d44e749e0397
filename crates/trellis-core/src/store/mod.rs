//! Storage backends for the supply-chain graph.
//!
//! The query layer reaches storage only through [`GraphBackend`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryBackend`]: a row index behind an async lock, loaded from JSON
//!   snapshots or filled through its `ingest_*` helpers
//! - [`SurrealBackend`]: embedded SurrealDB (RocksDB on disk or in-memory)

mod index;
mod memory;
mod snapshot;
mod surreal;

pub use index::{row_kinds_of, EntityRow, GraphIndex};
pub use memory::MemoryBackend;
pub use snapshot::GraphSnapshot;
pub use surreal::{ImportStats, SurrealBackend};

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{GraphError, Result};
use crate::ontology::{
    Artifact, Builder, EdgeFilter, GraphNode, IsDependency, License, NodeId, Package,
    PackageLeaf, Source, SourceLeaf, Vulnerability,
};
use crate::spec::{
    ArtifactSpec, BuilderSpec, EvidenceSpec, IsDependencySpec, LicenseSpec, Matches, PkgSpec,
    SourceSpec, SubjectSpec, VulnerabilitySpec,
};

/// How a backend serves adjacency requests restricted to several kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyMode {
    /// One `adjacent` call can filter on any set of kinds.
    SingleCall,
    /// Each `adjacent` call must name exactly one kind.
    PerKind,
}

/// A subject resolved to exactly one node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubject {
    pub id: NodeId,
    /// Ancestry from the node up to its root; `[id]` for flat nodes.
    pub chain: Vec<NodeId>,
    pub node: GraphNode,
}

/// Contract every storage backend implements.
///
/// Lookups return complete result sets. `adjacent` yields items in the
/// backend's stable order; callers rely on it for deterministic output.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn adjacency_mode(&self) -> AdjacencyMode {
        AdjacencyMode::SingleCall
    }

    async fn packages(&self, spec: &PkgSpec) -> Result<Vec<Package>>;

    async fn sources(&self, spec: &SourceSpec) -> Result<Vec<Source>>;

    async fn artifacts(&self, spec: &ArtifactSpec) -> Result<Vec<Artifact>>;

    async fn builders(&self, spec: &BuilderSpec) -> Result<Vec<Builder>>;

    async fn vulnerabilities(&self, spec: &VulnerabilitySpec) -> Result<Vec<Vulnerability>>;

    async fn licenses(&self, spec: &LicenseSpec) -> Result<Vec<License>>;

    /// Evidence records of any kind matching `spec`.
    async fn evidence(&self, spec: &EvidenceSpec) -> Result<Vec<GraphNode>>;

    async fn dependencies(&self, spec: &IsDependencySpec) -> Result<Vec<IsDependency>>;

    /// Node by id, or `NotFound`.
    async fn node(&self, id: &NodeId) -> Result<GraphNode>;

    /// Everything one hop from `id`, restricted by `filter`.
    async fn adjacent(&self, id: &NodeId, filter: &EdgeFilter) -> Result<Vec<GraphNode>>;

    /// Resolve a subject spec to exactly one node.
    ///
    /// Package specs that pin a version resolve to a version node; other
    /// package specs resolve to a name node. Zero matches is `NotFound`,
    /// several is `AmbiguousSubject`.
    async fn resolve_identity(&self, spec: &SubjectSpec) -> Result<ResolvedSubject> {
        if let Some(id) = spec.id() {
            let node = self.node(id).await?;
            let chain = chain_within(&node, id);
            return Ok(ResolvedSubject {
                id: id.clone(),
                chain,
                node,
            });
        }

        let candidates: Vec<Vec<NodeId>> = match spec {
            SubjectSpec::Package(s) => {
                let leaves: Vec<PackageLeaf> = self
                    .packages(s)
                    .await?
                    .iter()
                    .flat_map(Package::leaves)
                    .filter(|leaf| s.matches(leaf))
                    .collect();
                if s.targets_version() {
                    leaves.into_iter().map(|leaf| leaf.chain).collect()
                } else {
                    leaves
                        .into_iter()
                        .filter_map(|leaf| {
                            let name_id = leaf.name_id()?;
                            let pos = leaf.chain.iter().position(|id| id == name_id)?;
                            Some(leaf.chain[pos..].to_vec())
                        })
                        .collect()
                }
            }
            SubjectSpec::Source(s) => self
                .sources(s)
                .await?
                .iter()
                .flat_map(Source::leaves)
                .filter(|leaf: &SourceLeaf| s.matches(leaf))
                .map(|leaf| leaf.chain)
                .collect(),
            SubjectSpec::Artifact(s) => self
                .artifacts(s)
                .await?
                .into_iter()
                .map(|a| vec![a.id])
                .collect(),
        };

        let mut seen = HashSet::new();
        let mut unique: Vec<Vec<NodeId>> = candidates
            .into_iter()
            .filter(|chain| chain.first().is_some_and(|id| seen.insert(id.clone())))
            .collect();

        match unique.len() {
            0 => Err(GraphError::NotFound(spec.to_string())),
            1 => {
                let chain = unique.remove(0);
                let id = chain[0].clone();
                let node = self.node(&id).await?;
                Ok(ResolvedSubject { id, chain, node })
            }
            count => Err(GraphError::AmbiguousSubject {
                what: spec.to_string(),
                count,
            }),
        }
    }

    /// The single artifact with this algorithm and digest.
    async fn artifact_by_digest(&self, algorithm: &str, digest: &str) -> Result<Artifact> {
        let spec = ArtifactSpec {
            id: None,
            algorithm: Some(algorithm.to_string()),
            digest: Some(digest.to_string()),
        };
        let mut found = self.artifacts(&spec).await?;
        match found.len() {
            0 => Err(GraphError::NotFound(format!("artifact {}:{}", algorithm, digest))),
            1 => Ok(found.remove(0)),
            count => Err(GraphError::AmbiguousSubject {
                what: format!("artifact {}:{}", algorithm, digest),
                count,
            }),
        }
    }
}

/// Ancestry chain of `id` within a node returned for it.
fn chain_within(node: &GraphNode, id: &NodeId) -> Vec<NodeId> {
    let chain = match node {
        GraphNode::Package(p) => p.leaves().into_iter().find(|l| l.contains(id)).map(|l| {
            let pos = l.chain.iter().position(|c| c == id).unwrap_or(0);
            l.chain[pos..].to_vec()
        }),
        GraphNode::Source(s) => s.leaves().into_iter().find(|l| l.contains(id)).map(|l| {
            let pos = l.chain.iter().position(|c| c == id).unwrap_or(0);
            l.chain[pos..].to_vec()
        }),
        _ => None,
    };
    chain.unwrap_or_else(|| vec![id.clone()])
}
