//! Ghost node resolution.
//!
//! Every edge endpoint that is not among the fetched nodes gets exactly one
//! placeholder node, so no edge handed to a renderer dangles.

use std::collections::HashSet;

use crate::models::{GraphEdge, GraphNode};

/// Append ghost nodes for unresolved edge endpoints.
///
/// Ghosts are appended in first-reference order. Returns how many were created.
pub fn resolve_ghosts(nodes: &mut Vec<GraphNode>, edges: &[GraphEdge]) -> usize {
    let mut known: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut created = 0;

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if known.insert(endpoint.clone()) {
                tracing::debug!(id = %endpoint, edge = %edge.id, "synthesizing ghost node");
                nodes.push(GraphNode::ghost(endpoint.as_str()));
                created += 1;
            }
        }
    }

    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationKind;

    fn real(id: &str) -> GraphNode {
        let mut node = GraphNode::ghost(id);
        node.is_ghost = false;
        node
    }

    #[test]
    fn test_missing_endpoint_gets_ghost() {
        let mut nodes = vec![real("A")];
        let edges = vec![GraphEdge::new(RelationKind::IsDependingOn, "A", "Z")];
        assert_eq!(resolve_ghosts(&mut nodes, &edges), 1);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].id, "Z");
        assert!(nodes[1].is_ghost);
    }

    #[test]
    fn test_single_ghost_per_missing_id() {
        let mut nodes = vec![real("A"), real("B")];
        let edges = vec![
            GraphEdge::new(RelationKind::IsDependingOn, "A", "X"),
            GraphEdge::new(RelationKind::RelatedWith, "X", "B"),
            GraphEdge::new(RelationKind::PartOf, "B", "X"),
        ];
        assert_eq!(resolve_ghosts(&mut nodes, &edges), 1);
        assert_eq!(nodes.iter().filter(|n| n.id == "X").count(), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut nodes = vec![real("A")];
        let edges = vec![GraphEdge::new(RelationKind::IsDependingOn, "A", "Z")];
        resolve_ghosts(&mut nodes, &edges);
        assert_eq!(resolve_ghosts(&mut nodes, &edges), 0);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_no_ghost_for_known_endpoints() {
        let mut nodes = vec![real("A"), real("B")];
        let edges = vec![GraphEdge::new(RelationKind::IsDependingOn, "A", "B")];
        assert_eq!(resolve_ghosts(&mut nodes, &edges), 0);
    }
}
