//! Relation edge building.
//!
//! Walks every draft's relation arrays and emits a canonical, deduplicated
//! edge list. Direction is normalized per field:
//!
//! | field             | edge               | relation          |
//! |-------------------|--------------------|-------------------|
//! | `is_depending_on` | task -> other      | `is_depending_on` |
//! | `is_blocking`     | other -> task      | `is_depending_on` |
//! | `is_related_with` | other -> task      | `related_with`    |
//! | `is_part_of`      | task -> other      | `part_of`         |
//! | `has_part`        | other -> task      | `part_of`         |

use std::collections::{HashMap, HashSet};

use super::normalize::NodeDraft;
use crate::models::{GraphEdge, RelationField, TaskState};

/// Counters collected while building edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeStats {
    /// Relation entries that were not usable ids
    pub malformed_references: usize,
    /// Edges dropped because the same triple was already emitted
    pub duplicate_edges: usize,
    /// Edges dropped by the closed filter
    pub closed_edges: usize,
}

/// Builds the canonical edge set from node drafts.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBuilder {
    include_closed: bool,
}

impl EdgeBuilder {
    /// Create a builder; with `include_closed = false`, edges towards closed tasks are dropped.
    pub fn new(include_closed: bool) -> Self {
        Self { include_closed }
    }

    /// Emit edges and fill in the relation counters of every draft.
    pub fn build(&self, drafts: &mut [NodeDraft<'_>]) -> (Vec<GraphEdge>, EdgeStats) {
        let states: HashMap<String, Option<TaskState>> = drafts
            .iter()
            .map(|d| (d.node.id.clone(), d.node.state))
            .collect();

        let mut edges = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stats = EdgeStats::default();

        for draft in drafts.iter_mut() {
            let task = draft.task;
            let mut counts: HashMap<RelationField, usize> = HashMap::new();

            for &field in RelationField::all() {
                for entry in task.relation(field) {
                    let Some(other) = reference_id(entry) else {
                        tracing::warn!(
                            task = %task.id,
                            field = %field,
                            entry = %entry,
                            "skipping malformed relation reference"
                        );
                        stats.malformed_references += 1;
                        continue;
                    };
                    *counts.entry(field).or_default() += 1;

                    if !self.include_closed && is_closed(&states, other) {
                        stats.closed_edges += 1;
                        continue;
                    }

                    let edge = if field.task_is_source() {
                        GraphEdge::new(field.relation_kind(), task.id.as_str(), other)
                    } else {
                        GraphEdge::new(field.relation_kind(), other, task.id.as_str())
                    };

                    if seen.insert(edge.id.clone()) {
                        edges.push(edge);
                    } else {
                        tracing::debug!(edge = %edge.id, "duplicate edge");
                        stats.duplicate_edges += 1;
                    }
                }
            }

            let count = |field: RelationField| counts.get(&field).copied().unwrap_or(0);
            draft.node.nb_parents = count(RelationField::IsBlocking) + count(RelationField::IsPartOf);
            draft.node.nb_children =
                count(RelationField::IsDependingOn) + count(RelationField::HasPart);
            draft.node.nb_related = count(RelationField::IsRelatedWith);
        }

        (edges, stats)
    }
}

fn reference_id(entry: &serde_json::Value) -> Option<&str> {
    entry
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Unknown ids (future ghosts) are never considered closed.
fn is_closed(states: &HashMap<String, Option<TaskState>>, id: &str) -> bool {
    states
        .get(id)
        .copied()
        .flatten()
        .is_some_and(|s| s.is_closed())
}
