//! Graph model construction.
//!
//! The pipeline runs in a fixed order and always rebuilds from scratch:
//!
//! 1. [`normalize`] raw tasks into node drafts
//! 2. build the deduplicated edge set with [`edges::EdgeBuilder`]
//! 3. [`ghost::resolve_ghosts`] for endpoints that were never fetched
//! 4. apply the render filters (merge requests, external ghosts, isolated nodes)
//!
//! Every step after 3 removes nodes together with their incident edges, so
//! the finished model never contains a dangling edge.

pub mod edges;
pub mod ghost;
pub mod normalize;

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::target::Target;
use crate::models::{GraphEdge, GraphNode, RelationKind, Task, TaskKind};
use edges::EdgeBuilder;
use normalize::normalize;

/// Filters applied while building a graph.
///
/// Mirrors the `withClosed`, `withoutIsolated`, `withoutPrs` and
/// `withoutExternalDeps` query parameters of the graph API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFilters {
    /// Repositories the graph was requested for
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Keep edges whose far endpoint is closed or merged
    #[serde(default)]
    pub with_closed: bool,
    /// Drop nodes without any relation
    #[serde(default)]
    pub without_isolated: bool,
    /// Drop merge request nodes
    #[serde(default)]
    pub without_prs: bool,
    /// Drop ghost nodes that belong to none of the targets
    #[serde(default)]
    pub without_external_deps: bool,
}

/// What happened while building a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostics {
    pub invalid_records: usize,
    pub duplicate_records: usize,
    pub malformed_references: usize,
    pub duplicate_edges: usize,
    pub closed_edges: usize,
    pub ghost_nodes: usize,
    pub filtered_nodes: usize,
}

/// A fully resolved graph: every edge endpoint is a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub diagnostics: BuildDiagnostics,
}

impl GraphModel {
    /// Build a graph from a fetched task list.
    pub fn build(tasks: &[Task], filters: &GraphFilters) -> Self {
        let mut normalized = normalize(tasks);
        let (edges, stats) = EdgeBuilder::new(filters.with_closed).build(&mut normalized.drafts);

        let mut nodes: Vec<GraphNode> = normalized.drafts.into_iter().map(|d| d.node).collect();
        let ghost_nodes = ghost::resolve_ghosts(&mut nodes, &edges);

        let mut model = Self {
            nodes,
            edges,
            diagnostics: BuildDiagnostics {
                invalid_records: normalized.invalid,
                duplicate_records: normalized.duplicates,
                malformed_references: stats.malformed_references,
                duplicate_edges: stats.duplicate_edges,
                closed_edges: stats.closed_edges,
                ghost_nodes,
                filtered_nodes: 0,
            },
        };
        model.apply_filters(filters);

        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            ghosts = model.diagnostics.ghost_nodes,
            "graph built"
        );
        model
    }

    fn apply_filters(&mut self, filters: &GraphFilters) {
        if filters.without_prs {
            self.remove_nodes(|n| n.kind == TaskKind::MergeRequest);
        }

        if filters.without_external_deps && !filters.targets.is_empty() {
            let targets = &filters.targets;
            self.remove_nodes(|n| n.is_ghost && !targets.iter().any(|t| t.owns(&n.id)));
        }

        if filters.without_isolated {
            let connected: HashSet<String> = self
                .edges
                .iter()
                .flat_map(|e| [e.source.clone(), e.target.clone()])
                .collect();
            self.remove_nodes(|n| n.is_isolated() && !connected.contains(&n.id));
        }
    }

    /// Remove matching nodes and every edge touching them.
    fn remove_nodes(&mut self, predicate: impl Fn(&GraphNode) -> bool) {
        let removed: HashSet<String> = self
            .nodes
            .iter()
            .filter(|n| predicate(n))
            .map(|n| n.id.clone())
            .collect();
        if removed.is_empty() {
            return;
        }
        self.nodes.retain(|n| !removed.contains(&n.id));
        self.edges
            .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
        self.diagnostics.filtered_nodes += removed.len();
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edge endpoints that don't resolve to a node. Always empty for a built model.
    pub fn unresolved_endpoints(&self) -> Vec<&str> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .filter(|id| !ids.contains(id))
            .collect()
    }

    /// Number of ghost nodes in the graph.
    pub fn ghost_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_ghost).count()
    }

    /// Render the graph as a Graphviz DOT digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph depviz {\n");
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box, style=rounded];\n");

        for node in &self.nodes {
            let _ = write!(
                out,
                "  {} [label={}, href={}",
                dot_quote(&node.id),
                dot_quote(&node.title),
                dot_quote(&node.id)
            );
            if node.is_ghost {
                out.push_str(", style=\"rounded,dashed\", color=grey");
            } else if node.is_closed() {
                out.push_str(", color=grey");
            }
            out.push_str("];\n");
        }

        for edge in &self.edges {
            let style = match edge.relation {
                RelationKind::IsDependingOn => "solid",
                RelationKind::RelatedWith => "dashed",
                RelationKind::PartOf => "dotted",
            };
            let _ = writeln!(
                out,
                "  {} -> {} [label={}, style={}];",
                dot_quote(&edge.source),
                dot_quote(&edge.target),
                dot_quote(&edge.relation.to_string()),
                style
            );
        }

        out.push_str("}\n");
        out
    }
}

fn dot_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
