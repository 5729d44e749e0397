//! Path construction and route search.

use std::collections::{HashMap, HashSet};

use super::{fan_out, QueryContext};
use crate::error::{GraphError, Result};
use crate::ontology::{EdgeFilter, GraphNode, NodeId};
use crate::store::GraphBackend;

/// Concatenate a root chain and a neighbor fragment, keeping the first
/// occurrence of every id.
pub fn build_path(root_chain: &[NodeId], fragment: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    root_chain
        .iter()
        .chain(fragment)
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Shortest route from `from` to `to` of at most `max_len` hops.
///
/// Breadth-first over `adjacent`, restricted to `using_only`. Each level is
/// expanded with a parallel fan-out; among routes of equal length the one
/// discovered first in backend order wins. Returns the nodes along the
/// route, `from` first.
pub async fn find_route(
    backend: &dyn GraphBackend,
    ctx: &QueryContext,
    from: &NodeId,
    to: &NodeId,
    max_len: usize,
    using_only: &EdgeFilter,
) -> Result<Vec<GraphNode>> {
    let start = ctx.call(backend.node(from)).await?;
    if from == to {
        return Ok(vec![start]);
    }

    let mut visited: HashSet<NodeId> = HashSet::from([from.clone()]);
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut seen_nodes: HashMap<NodeId, GraphNode> = HashMap::new();
    let mut frontier = vec![from.clone()];

    for _ in 0..max_len {
        if frontier.is_empty() {
            break;
        }
        let expansions = fan_out(
            ctx,
            frontier
                .iter()
                .map(|id| async move { ctx.call(backend.adjacent(id, using_only)).await }),
        )
        .await?;

        let mut next = Vec::new();
        for (parent, items) in frontier.iter().zip(expansions) {
            for item in items {
                let Some(item_id) = item.leaf_id().cloned() else {
                    continue;
                };
                if !visited.insert(item_id.clone()) {
                    continue;
                }
                came_from.insert(item_id.clone(), parent.clone());
                seen_nodes.insert(item_id.clone(), item);
                if &item_id == to {
                    return Ok(unwind(start, to, &came_from, seen_nodes));
                }
                next.push(item_id);
            }
        }
        frontier = next;
    }

    Err(GraphError::NotFound(format!(
        "route from {} to {} within {} hops",
        from, to, max_len
    )))
}

fn unwind(
    start: GraphNode,
    to: &NodeId,
    came_from: &HashMap<NodeId, NodeId>,
    mut seen_nodes: HashMap<NodeId, GraphNode>,
) -> Vec<GraphNode> {
    let mut route = Vec::new();
    let mut cursor = Some(to.clone());
    while let Some(id) = cursor {
        match seen_nodes.remove(&id) {
            Some(node) => route.push(node),
            None => break,
        }
        cursor = came_from.get(&id).cloned();
    }
    route.push(start);
    route.reverse();
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<NodeId> {
        raw.iter().map(|s| NodeId::from(*s)).collect()
    }

    #[test]
    fn test_build_path_stable_dedup() {
        let path = build_path(&ids(&["v", "n", "ns", "t"]), &ids(&["e1", "n", "e2", "e1"]));
        assert_eq!(path, ids(&["v", "n", "ns", "t", "e1", "e2"]));
    }

    #[test]
    fn test_build_path_empty_inputs() {
        assert!(build_path(&[], &[]).is_empty());
        assert_eq!(build_path(&[], &ids(&["a", "a"])), ids(&["a"]));
    }
}
