//! Neighbor resolution: everything attached to one node, bucketed by kind.

use std::sync::Arc;

use serde::Serialize;

use super::{fan_out, QueryContext};
use crate::error::Result;
use crate::ontology::{
    CertifyBad, CertifyGood, CertifyLegal, CertifyScorecard, CertifyVexStatement, CertifyVuln,
    EdgeFilter, EdgeKind, GraphNode, HasSbom, HasSlsa, HasSourceAt, HashEqual, IsDependency,
    IsOccurrence, NodeId, PkgEqual,
};
use crate::store::{AdjacencyMode, GraphBackend};

/// Kinds that may be filled in from the artifacts a node occurs as.
const SECONDARY_HOP_KINDS: [EdgeKind; 3] =
    [EdgeKind::CertifyVuln, EdgeKind::HasSbom, EdgeKind::HasSlsa];

/// Evidence adjacent to one node, one bucket per kind.
///
/// Buckets keep backend order. `path` lists the ids of the evidence found
/// directly on the node, in the order the backend yielded them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Neighbors {
    pub dependencies: Vec<IsDependency>,
    pub occurrences: Vec<IsOccurrence>,
    pub hash_equal: Vec<HashEqual>,
    pub pkg_equal: Vec<PkgEqual>,
    pub has_source_at: Vec<HasSourceAt>,
    pub has_sbom: Vec<HasSbom>,
    pub has_slsa: Vec<HasSlsa>,
    pub certify_vuln: Vec<CertifyVuln>,
    pub certify_vex: Vec<CertifyVexStatement>,
    pub certify_bad: Vec<CertifyBad>,
    pub certify_good: Vec<CertifyGood>,
    pub scorecards: Vec<CertifyScorecard>,
    pub certify_legal: Vec<CertifyLegal>,
    pub path: Vec<NodeId>,
}

impl Neighbors {
    /// Put an evidence node in its bucket. Entities and unrecognized nodes
    /// are ignored; returns whether the node was kept.
    fn absorb(&mut self, node: GraphNode) -> bool {
        match node {
            GraphNode::IsDependency(e) => self.dependencies.push(e),
            GraphNode::IsOccurrence(e) => self.occurrences.push(e),
            GraphNode::HashEqual(e) => self.hash_equal.push(e),
            GraphNode::PkgEqual(e) => self.pkg_equal.push(e),
            GraphNode::HasSourceAt(e) => self.has_source_at.push(e),
            GraphNode::HasSbom(e) => self.has_sbom.push(e),
            GraphNode::HasSlsa(e) => self.has_slsa.push(e),
            GraphNode::CertifyVuln(e) => self.certify_vuln.push(e),
            GraphNode::CertifyVexStatement(e) => self.certify_vex.push(e),
            GraphNode::CertifyBad(e) => self.certify_bad.push(e),
            GraphNode::CertifyGood(e) => self.certify_good.push(e),
            GraphNode::CertifyScorecard(e) => self.scorecards.push(e),
            GraphNode::CertifyLegal(e) => self.certify_legal.push(e),
            GraphNode::Package(_)
            | GraphNode::Source(_)
            | GraphNode::Artifact(_)
            | GraphNode::Builder(_)
            | GraphNode::Vulnerability(_)
            | GraphNode::License(_)
            | GraphNode::Unrecognized => return false,
        }
        true
    }

    /// Number of records in one bucket.
    pub fn count(&self, kind: EdgeKind) -> usize {
        match kind {
            EdgeKind::IsDependency => self.dependencies.len(),
            EdgeKind::IsOccurrence => self.occurrences.len(),
            EdgeKind::HashEqual => self.hash_equal.len(),
            EdgeKind::PkgEqual => self.pkg_equal.len(),
            EdgeKind::HasSourceAt => self.has_source_at.len(),
            EdgeKind::HasSbom => self.has_sbom.len(),
            EdgeKind::HasSlsa => self.has_slsa.len(),
            EdgeKind::CertifyVuln => self.certify_vuln.len(),
            EdgeKind::CertifyVexStatement => self.certify_vex.len(),
            EdgeKind::CertifyBad => self.certify_bad.len(),
            EdgeKind::CertifyGood => self.certify_good.len(),
            EdgeKind::CertifyScorecard => self.scorecards.len(),
            EdgeKind::CertifyLegal => self.certify_legal.len(),
        }
    }

    /// Total records across all buckets.
    pub fn len(&self) -> usize {
        EdgeKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record as a [`GraphNode`], bucket by bucket.
    pub fn records(&self) -> Vec<GraphNode> {
        let mut out: Vec<GraphNode> = Vec::with_capacity(self.len());
        out.extend(self.dependencies.iter().cloned().map(GraphNode::from));
        out.extend(self.occurrences.iter().cloned().map(GraphNode::from));
        out.extend(self.hash_equal.iter().cloned().map(GraphNode::from));
        out.extend(self.pkg_equal.iter().cloned().map(GraphNode::from));
        out.extend(self.has_source_at.iter().cloned().map(GraphNode::from));
        out.extend(self.has_sbom.iter().cloned().map(GraphNode::from));
        out.extend(self.has_slsa.iter().cloned().map(GraphNode::from));
        out.extend(self.certify_vuln.iter().cloned().map(GraphNode::from));
        out.extend(self.certify_vex.iter().cloned().map(GraphNode::from));
        out.extend(self.certify_bad.iter().cloned().map(GraphNode::from));
        out.extend(self.certify_good.iter().cloned().map(GraphNode::from));
        out.extend(self.scorecards.iter().cloned().map(GraphNode::from));
        out.extend(self.certify_legal.iter().cloned().map(GraphNode::from));
        out
    }

    fn bucket_ids(&self, kind: EdgeKind) -> Vec<&NodeId> {
        match kind {
            EdgeKind::CertifyVuln => self.certify_vuln.iter().map(|e| &e.id).collect(),
            EdgeKind::HasSbom => self.has_sbom.iter().map(|e| &e.id).collect(),
            EdgeKind::HasSlsa => self.has_slsa.iter().map(|e| &e.id).collect(),
            _ => Vec::new(),
        }
    }
}

/// Classifies a node's adjacency into [`Neighbors`].
#[derive(Clone)]
pub struct NeighborResolver {
    backend: Arc<dyn GraphBackend>,
    secondary_hop: bool,
}

impl NeighborResolver {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            secondary_hop: true,
        }
    }

    /// Enable or disable following occurrences to artifact-level evidence.
    pub fn with_secondary_hop(mut self, enabled: bool) -> Self {
        self.secondary_hop = enabled;
        self
    }

    pub async fn neighbors(
        &self,
        ctx: &QueryContext,
        id: &NodeId,
        filter: &EdgeFilter,
    ) -> Result<Neighbors> {
        let items = self.adjacent(ctx, id, filter).await?;

        let mut neighbors = Neighbors::default();
        for item in items {
            let item_id = item.id().cloned();
            if neighbors.absorb(item) {
                if let Some(item_id) = item_id {
                    neighbors.path.push(item_id);
                }
            }
        }

        if self.secondary_hop && !neighbors.occurrences.is_empty() {
            let kinds: Vec<EdgeKind> = SECONDARY_HOP_KINDS
                .into_iter()
                .filter(|k| filter.allows(*k) && neighbors.count(*k) == 0)
                .collect();
            if !kinds.is_empty() {
                self.secondary_hop(ctx, &kinds, &mut neighbors).await?;
            }
        }

        tracing::trace!(%id, records = neighbors.len(), "resolved neighbors");
        Ok(neighbors)
    }

    /// Adjacency restricted to `filter`, one call per kind when the backend
    /// cannot filter several kinds at once.
    async fn adjacent(
        &self,
        ctx: &QueryContext,
        id: &NodeId,
        filter: &EdgeFilter,
    ) -> Result<Vec<GraphNode>> {
        let backend = self.backend.as_ref();
        match backend.adjacency_mode() {
            AdjacencyMode::SingleCall => ctx.call(backend.adjacent(id, filter)).await,
            AdjacencyMode::PerKind => {
                let per_kind = fan_out(
                    ctx,
                    filter.kinds().into_iter().map(|kind| async move {
                        ctx.call(backend.adjacent(id, &EdgeFilter::single(kind))).await
                    }),
                )
                .await?;
                Ok(per_kind.into_iter().flatten().collect())
            }
        }
    }

    /// Fill empty `kinds` buckets from the artifacts each occurrence points
    /// at. One level deep; lookup failures are logged and skipped, but
    /// cancellation still aborts the request.
    async fn secondary_hop(
        &self,
        ctx: &QueryContext,
        kinds: &[EdgeKind],
        neighbors: &mut Neighbors,
    ) -> Result<()> {
        let backend = self.backend.as_ref();
        let per_occurrence = fan_out(
            ctx,
            neighbors.occurrences.iter().map(|occurrence| {
                let algorithm = occurrence.artifact.algorithm.clone();
                let digest = occurrence.artifact.digest.clone();
                async move {
                    let artifact = match ctx
                        .call(backend.artifact_by_digest(&algorithm, &digest))
                        .await
                    {
                        Ok(artifact) => artifact,
                        Err(e) if e.is_cancellation() => return Err(e),
                        Err(e) => {
                            tracing::debug!(%algorithm, %digest, error = %e, "secondary hop: artifact lookup failed");
                            return Ok(Vec::new());
                        }
                    };

                    let mut found = Vec::new();
                    for kind in kinds {
                        match ctx
                            .call(backend.adjacent(&artifact.id, &EdgeFilter::single(*kind)))
                            .await
                        {
                            Ok(items) => found.extend(
                                items.into_iter().filter(|n| n.edge_kind() == Some(*kind)),
                            ),
                            Err(e) if e.is_cancellation() => return Err(e),
                            Err(e) => {
                                tracing::debug!(artifact = %artifact.id, %kind, error = %e, "secondary hop: adjacency failed");
                            }
                        }
                    }
                    Ok(found)
                }
            }),
        )
        .await?;

        for node in per_occurrence.into_iter().flatten() {
            let Some(kind) = node.edge_kind() else {
                continue;
            };
            let duplicate = node
                .id()
                .is_some_and(|id| neighbors.bucket_ids(kind).contains(&id));
            if !duplicate {
                neighbors.absorb(node);
            }
        }
        Ok(())
    }
}
