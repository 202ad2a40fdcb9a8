//! Task record normalization.
//!
//! Turns raw [`Task`] records into node drafts: one per distinct id, first
//! occurrence wins. Bare records, with neither a kind, a state nor any
//! relation entry, are treated as invalid and dropped; when another task
//! references them they come back as ghost nodes.

use std::collections::HashSet;

use crate::models::{CardClass, GraphNode, Task, TaskKind};

/// A normalized task, still carrying its raw relation arrays.
#[derive(Debug, Clone)]
pub struct NodeDraft<'a> {
    /// The source record
    pub task: &'a Task,
    /// Node derived from the record; counters are filled in by the edge builder
    pub node: GraphNode,
}

/// Outcome of normalizing a task list.
#[derive(Debug, Default)]
pub struct Normalized<'a> {
    pub drafts: Vec<NodeDraft<'a>>,
    /// Records dropped for an empty id or for carrying neither kind, state nor relations
    pub invalid: usize,
    /// Records dropped because their id was already seen
    pub duplicates: usize,
}

/// Normalize a task list into node drafts.
pub fn normalize(tasks: &[Task]) -> Normalized<'_> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(tasks.len());
    let mut out = Normalized::default();

    for task in tasks {
        if task.id.trim().is_empty() {
            tracing::warn!("skipping task record with empty id");
            out.invalid += 1;
            continue;
        }
        if task.kind.is_none() && task.state.is_none() && !task.has_relations() {
            tracing::warn!(id = %task.id, "skipping bare task record");
            out.invalid += 1;
            continue;
        }
        if !seen.insert(task.id.as_str()) {
            tracing::debug!(id = %task.id, "duplicate task record, keeping first occurrence");
            out.duplicates += 1;
            continue;
        }
        out.drafts.push(NodeDraft {
            task,
            node: draft_node(task),
        });
    }

    out
}

fn draft_node(task: &Task) -> GraphNode {
    let kind = task.kind.unwrap_or(TaskKind::Unknown);
    if kind == TaskKind::Unknown {
        tracing::debug!(id = %task.id, "unsupported task kind");
    }
    let card_class = CardClass::from_task(kind, task.state);
    let card_classes = match kind.card_label() {
        Some(label) => format!("{} {}", card_class, label),
        None => card_class.to_string(),
    };

    GraphNode {
        id: task.id.clone(),
        local_id: task.local_id.clone(),
        kind,
        state: task.state,
        title: task.display_title().to_string(),
        card_class,
        card_classes,
        bgcolor: kind.bgcolor().to_string(),
        nb_parents: 0,
        nb_children: 0,
        nb_related: 0,
        is_ghost: false,
        parent_group_id: parent_group(task),
        created_at: task.created_at,
        completed_at: task.completed_at,
        estimated_duration: task.estimated_duration.clone(),
    }
}

/// Milestone takes precedence over owner.
fn parent_group(task: &Task) -> Option<String> {
    let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();
    non_empty(&task.has_milestone).or_else(|| non_empty(&task.has_owner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskState;

    #[test]
    fn test_normalize_classifies_kinds() {
        let tasks = vec![
            Task::new("A").with_kind(TaskKind::Issue).with_state(TaskState::Open),
            Task::new("B")
                .with_kind(TaskKind::MergeRequest)
                .with_state(TaskState::Open),
            Task::new("C")
                .with_kind(TaskKind::Milestone)
                .with_state(TaskState::Closed),
        ];
        let normalized = normalize(&tasks);
        let classes: Vec<&str> = normalized
            .drafts
            .iter()
            .map(|d| d.node.card_classes.as_str())
            .collect();
        assert_eq!(classes, vec!["open issue", "in-progress pr", "closed milestone"]);
        assert_eq!(normalized.drafts[1].node.bgcolor, "purple");
    }

    #[test]
    fn test_normalize_unknown_kind_keeps_node() {
        let task: Task = serde_json::from_str(r#"{"id":"E","kind":"Epic","state":"Open"}"#).unwrap();
        let normalized = normalize(std::slice::from_ref(&task));
        assert_eq!(normalized.drafts.len(), 1);
        let node = &normalized.drafts[0].node;
        assert_eq!(node.kind, TaskKind::Unknown);
        assert_eq!(node.card_classes, "open");
        assert_eq!(node.bgcolor, "grey");
    }

    #[test]
    fn test_normalize_state_only_is_valid() {
        let tasks = vec![Task::new("A").with_state(TaskState::Merged)];
        let normalized = normalize(&tasks);
        assert_eq!(normalized.drafts.len(), 1);
        assert_eq!(normalized.drafts[0].node.kind, TaskKind::Unknown);
        assert_eq!(normalized.drafts[0].node.card_class, CardClass::Closed);
    }

    #[test]
    fn test_normalize_skips_invalid_records() {
        let tasks = vec![
            Task::new("A"),
            Task::new("B").with_kind(TaskKind::Issue),
            Task::new(" ").with_kind(TaskKind::Issue),
        ];
        let normalized = normalize(&tasks);
        assert_eq!(normalized.drafts.len(), 1);
        assert_eq!(normalized.drafts[0].node.id, "B");
        assert_eq!(normalized.invalid, 2);
    }

    #[test]
    fn test_normalize_keeps_untyped_record_with_relations() {
        let tasks = vec![
            Task::new("A").with_relation(crate::models::RelationField::IsDependingOn, &["B"]),
            Task::new("B"),
        ];
        let normalized = normalize(&tasks);
        assert_eq!(normalized.drafts.len(), 1);
        assert_eq!(normalized.drafts[0].node.id, "A");
        assert_eq!(normalized.drafts[0].node.kind, TaskKind::Unknown);
        assert_eq!(normalized.drafts[0].node.card_classes, "error");
        assert_eq!(normalized.invalid, 1);
    }

    #[test]
    fn test_normalize_first_duplicate_wins() {
        let tasks = vec![
            Task::new("A").with_kind(TaskKind::Issue).with_title("first"),
            Task::new("A").with_kind(TaskKind::Issue).with_title("second"),
        ];
        let normalized = normalize(&tasks);
        assert_eq!(normalized.drafts.len(), 1);
        assert_eq!(normalized.drafts[0].node.title, "first");
        assert_eq!(normalized.duplicates, 1);
    }

    #[test]
    fn test_unrecognized_state_is_error_card() {
        let task: Task =
            serde_json::from_str(r#"{"id":"A","kind":"Issue","state":"Draft"}"#).unwrap();
        let normalized = normalize(std::slice::from_ref(&task));
        assert_eq!(normalized.drafts[0].node.card_classes, "error issue");
    }

    #[test]
    fn test_parent_group_milestone_precedence() {
        let mut task = Task::new("A").with_kind(TaskKind::Issue);
        task.has_owner = Some("owner".to_string());
        assert_eq!(parent_group(&task).as_deref(), Some("owner"));

        task.has_milestone = Some("m1".to_string());
        assert_eq!(parent_group(&task).as_deref(), Some("m1"));

        task.has_milestone = Some(String::new());
        assert_eq!(parent_group(&task).as_deref(), Some("owner"));
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let tasks = vec![Task::new("A").with_kind(TaskKind::Issue)];
        let before = serde_json::to_string(&tasks).unwrap();
        let _ = normalize(&tasks);
        assert_eq!(serde_json::to_string(&tasks).unwrap(), before);
    }
}
