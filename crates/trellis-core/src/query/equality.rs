//! Equality lookups over HashEqual and PkgEqual records.
//!
//! A record links two nodes in both directions. Transitive closure is never
//! stored; [`equivalence_class`] computes it on request.

use std::collections::HashSet;

use super::{fan_out, QueryContext};
use crate::error::Result;
use crate::ontology::{EdgeFilter, EdgeKind, GraphNode, NodeId};
use crate::store::GraphBackend;

/// Which equality relation to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityKind {
    /// Artifacts linked by HashEqual.
    Hash,
    /// Package versions linked by PkgEqual.
    Package,
}

impl EqualityKind {
    pub fn edge_kind(&self) -> EdgeKind {
        match self {
            EqualityKind::Hash => EdgeKind::HashEqual,
            EqualityKind::Package => EdgeKind::PkgEqual,
        }
    }
}

/// Nodes one equality record away from `id`, in backend order.
pub async fn direct_equivalents(
    backend: &dyn GraphBackend,
    ctx: &QueryContext,
    id: &NodeId,
    kind: EqualityKind,
) -> Result<Vec<NodeId>> {
    let filter = EdgeFilter::single(kind.edge_kind());
    let records = ctx.call(backend.adjacent(id, &filter)).await?;

    let mut out: Vec<NodeId> = Vec::new();
    for record in &records {
        let other = match record {
            GraphNode::HashEqual(e) => e.other_side(id),
            GraphNode::PkgEqual(e) => e.other_side(id),
            _ => None,
        };
        if let Some(other) = other {
            if other != id && !out.contains(other) {
                out.push(other.clone());
            }
        }
    }
    Ok(out)
}

/// Every node reachable from `id` through equality records, in discovery
/// order, excluding `id` itself.
pub async fn equivalence_class(
    backend: &dyn GraphBackend,
    ctx: &QueryContext,
    id: &NodeId,
    kind: EqualityKind,
) -> Result<Vec<NodeId>> {
    let mut visited: HashSet<NodeId> = HashSet::from([id.clone()]);
    let mut class = Vec::new();
    let mut frontier = vec![id.clone()];

    while !frontier.is_empty() {
        let expansions = fan_out(
            ctx,
            frontier
                .iter()
                .map(|node| direct_equivalents(backend, ctx, node, kind)),
        )
        .await?;

        let mut next = Vec::new();
        for found in expansions.into_iter().flatten() {
            if visited.insert(found.clone()) {
                class.push(found.clone());
                next.push(found);
            }
        }
        frontier = next;
    }
    Ok(class)
}
