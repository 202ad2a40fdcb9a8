//! Data models for depviz.
//!
//! This module defines the core data structures:
//! - `Task` - Raw work item as returned by the graph API (issue, milestone, merge request)
//! - `TaskKind` / `TaskState` - Closed classification enums with an explicit `Unknown` variant
//! - `RelationKind` - Normalized relationship type carried by graph edges
//! - `GraphNode` - Derived node, one per task id (real or ghost)
//! - `GraphEdge` - Derived directed edge, unique per `(relation, source, target)`

pub mod target;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a fetched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Issue,
    Milestone,
    MergeRequest,
    /// Any kind string this client does not know about
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    /// Label appended to a node's card classes.
    ///
    /// Returns `None` for unknown kinds, which get no kind label.
    pub fn card_label(&self) -> Option<&'static str> {
        match self {
            TaskKind::Issue => Some("issue"),
            TaskKind::Milestone => Some("milestone"),
            TaskKind::MergeRequest => Some("pr"),
            TaskKind::Unknown => None,
        }
    }

    /// Background color category used by card templates.
    pub fn bgcolor(&self) -> &'static str {
        match self {
            TaskKind::Issue => "lightblue",
            TaskKind::Milestone => "lightgreen",
            TaskKind::MergeRequest => "purple",
            TaskKind::Unknown => "grey",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Issue => "Issue",
            TaskKind::Milestone => "Milestone",
            TaskKind::MergeRequest => "MergeRequest",
            TaskKind::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Open,
    Closed,
    Merged,
    /// Placeholder state for ghost nodes that were never fetched
    Missing,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Returns true for states that count as finished work.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskState::Closed | TaskState::Merged)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Open => "Open",
            TaskState::Closed => "Closed",
            TaskState::Merged => "Merged",
            TaskState::Missing => "Missing",
            TaskState::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// A work item as received from the graph API.
///
/// Relation arrays are kept as raw JSON values so a single malformed entry
/// can be skipped without rejecting the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    /// Globally unique, URL-like identifier
    pub id: String,

    /// Short human-readable identifier (e.g., "moul/depviz#42")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaskKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TaskState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provider that produced this task (github, gitlab, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Free-form duration estimate such as "3d" or "2w"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,

    /// Ids this task depends on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_depending_on: Option<Vec<serde_json::Value>>,

    /// Ids of tasks blocked by this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blocking: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_related_with: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_part_of: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_part: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_milestone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_assignee: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_label: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reviewer: Option<Vec<serde_json::Value>>,
}

impl Task {
    /// Create a bare task with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the kind.
    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the state.
    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append ids to one of the relation arrays.
    pub fn with_relation(mut self, field: RelationField, ids: &[&str]) -> Self {
        let values = ids
            .iter()
            .map(|id| serde_json::Value::String((*id).to_string()));
        self.relation_mut(field)
            .get_or_insert_with(Vec::new)
            .extend(values);
        self
    }

    /// Raw entries of a relation array (empty when absent).
    pub fn relation(&self, field: RelationField) -> &[serde_json::Value] {
        let values = match field {
            RelationField::IsDependingOn => &self.is_depending_on,
            RelationField::IsBlocking => &self.is_blocking,
            RelationField::IsRelatedWith => &self.is_related_with,
            RelationField::IsPartOf => &self.is_part_of,
            RelationField::HasPart => &self.has_part,
        };
        values.as_deref().unwrap_or(&[])
    }

    fn relation_mut(&mut self, field: RelationField) -> &mut Option<Vec<serde_json::Value>> {
        match field {
            RelationField::IsDependingOn => &mut self.is_depending_on,
            RelationField::IsBlocking => &mut self.is_blocking,
            RelationField::IsRelatedWith => &mut self.is_related_with,
            RelationField::IsPartOf => &mut self.is_part_of,
            RelationField::HasPart => &mut self.has_part,
        }
    }

    /// Returns true if any relation array has at least one entry.
    pub fn has_relations(&self) -> bool {
        RelationField::all()
            .iter()
            .any(|&field| !self.relation(field).is_empty())
    }

    /// Title to display, falling back to the local id then the id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.local_id.as_deref())
            .unwrap_or(&self.id)
    }
}

/// One of the multi-valued relation fields of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationField {
    IsDependingOn,
    IsBlocking,
    IsRelatedWith,
    IsPartOf,
    HasPart,
}

impl RelationField {
    /// All relation fields, in edge emission order.
    pub fn all() -> &'static [RelationField] {
        &[
            RelationField::IsDependingOn,
            RelationField::IsBlocking,
            RelationField::IsRelatedWith,
            RelationField::IsPartOf,
            RelationField::HasPart,
        ]
    }

    /// Relation kind of the edge emitted for this field.
    pub fn relation_kind(&self) -> RelationKind {
        match self {
            RelationField::IsDependingOn | RelationField::IsBlocking => RelationKind::IsDependingOn,
            RelationField::IsRelatedWith => RelationKind::RelatedWith,
            RelationField::IsPartOf | RelationField::HasPart => RelationKind::PartOf,
        }
    }

    /// Whether the declaring task is the edge source (`task -> other`).
    ///
    /// When false the edge is reversed (`other -> task`).
    pub fn task_is_source(&self) -> bool {
        matches!(
            self,
            RelationField::IsDependingOn | RelationField::IsPartOf
        )
    }
}

impl fmt::Display for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationField::IsDependingOn => "is_depending_on",
            RelationField::IsBlocking => "is_blocking",
            RelationField::IsRelatedWith => "is_related_with",
            RelationField::IsPartOf => "is_part_of",
            RelationField::HasPart => "has_part",
        };
        write!(f, "{}", s)
    }
}

/// Type of a normalized graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Source depends on target
    IsDependingOn,
    /// Informational link
    RelatedWith,
    /// Source is contained in target
    PartOf,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::IsDependingOn => "is_depending_on",
            RelationKind::RelatedWith => "related_with",
            RelationKind::PartOf => "part_of",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "is_depending_on" => Ok(RelationKind::IsDependingOn),
            "related_with" => Ok(RelationKind::RelatedWith),
            "part_of" => Ok(RelationKind::PartOf),
            _ => Err(format!("Unknown relation kind: {}", s)),
        }
    }
}

/// State label shown on a node's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardClass {
    Open,
    InProgress,
    Closed,
    Error,
    Ghost,
}

impl CardClass {
    /// Derive the card label from a task's kind and state.
    pub fn from_task(kind: TaskKind, state: Option<TaskState>) -> Self {
        match state {
            Some(TaskState::Open) if kind == TaskKind::MergeRequest => CardClass::InProgress,
            Some(TaskState::Open) => CardClass::Open,
            Some(TaskState::Closed | TaskState::Merged) => CardClass::Closed,
            Some(TaskState::Missing) => CardClass::Ghost,
            Some(TaskState::Unknown) | None => CardClass::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardClass::Open => "open",
            CardClass::InProgress => "in-progress",
            CardClass::Closed => "closed",
            CardClass::Error => "error",
            CardClass::Ghost => "ghost",
        }
    }
}

impl fmt::Display for CardClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the constructed graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Task id, unique within one graph
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,

    pub kind: TaskKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TaskState>,

    pub title: String,

    /// State label of the card
    pub card_class: CardClass,

    /// Full class string for card templates, e.g. "in-progress pr"
    pub card_classes: String,

    /// Background color category
    pub bgcolor: String,

    /// |is_blocking| + |is_part_of|
    pub nb_parents: usize,

    /// |is_depending_on| + |has_part|
    pub nb_children: usize,

    /// |is_related_with|
    pub nb_related: usize,

    /// True when synthesized for an edge endpoint that was never fetched
    pub is_ghost: bool,

    /// Milestone or owner used for hierarchical grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
}

impl GraphNode {
    /// Title used for ghost nodes.
    pub const GHOST_TITLE: &'static str = "Ghost issue";

    /// Create a placeholder node for an id that was referenced but never fetched.
    pub fn ghost(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            local_id: None,
            kind: TaskKind::Issue,
            state: Some(TaskState::Missing),
            title: Self::GHOST_TITLE.to_string(),
            card_class: CardClass::Ghost,
            card_classes: CardClass::Ghost.as_str().to_string(),
            bgcolor: TaskKind::Unknown.bgcolor().to_string(),
            nb_parents: 0,
            nb_children: 0,
            nb_related: 0,
            is_ghost: true,
            parent_group_id: None,
            created_at: None,
            completed_at: None,
            estimated_duration: None,
        }
    }

    /// Returns true if the node has no relation counters at all.
    pub fn is_isolated(&self) -> bool {
        self.nb_parents == 0 && self.nb_children == 0 && self.nb_related == 0
    }

    /// Returns true if the node's task is closed or merged.
    pub fn is_closed(&self) -> bool {
        self.state.is_some_and(|s| s.is_closed())
    }
}

/// A directed, typed edge between two graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Canonical id derived from `(relation, source, target)`
    pub id: String,

    pub source: String,

    pub target: String,

    pub relation: RelationKind,
}

impl GraphEdge {
    /// Create an edge; the id is derived from the identity triple.
    pub fn new(relation: RelationKind, source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::canonical_id(relation, &source, &target),
            source,
            target,
            relation,
        }
    }

    /// Build the deduplication key for an edge.
    pub fn canonical_id(relation: RelationKind, source: &str, target: &str) -> String {
        format!("{}|{}|{}", relation, source, target)
    }
}

/// Envelope of the graph API response.
#[derive(Debug, Clone, Default, Deserialize)]
struct TaskListEnvelope {
    #[serde(default)]
    tasks: Option<Vec<serde_json::Value>>,
}

/// Parse a `{ "tasks": [...] }` payload record by record.
///
/// Records that cannot be decoded are skipped with a warning; a missing or
/// null `tasks` field yields an empty list.
pub fn parse_task_list(json: &str) -> crate::Result<Vec<Task>> {
    let envelope: TaskListEnvelope = serde_json::from_str(json)?;
    Ok(decode_tasks(envelope.tasks.unwrap_or_default()))
}

/// Decode raw task records, dropping the ones that don't fit the schema.
pub fn decode_tasks(records: Vec<serde_json::Value>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable task record");
            }
        }
    }
    tasks
}
