//! Dependency-ordered scheduling for the sequential layouts.
//!
//! Tasks without dependencies are anchored at their creation date. Every
//! other task starts once all of its dependencies have ended. Dependencies
//! that are not among the fetched tasks become fixed-duration placeholder
//! entries starting at the plan origin. This is independent of ghost nodes:
//! ghosts are never scheduled themselves.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use chrono::{DateTime, Days, NaiveDate, Utc};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::SequentialConfig;
use crate::graph::GraphModel;
use crate::models::{CardClass, GraphNode, RelationKind};

/// Scheduling state of a plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Done,
    Active,
    Pending,
    /// Synthesized for a dependency that was not fetched
    Placeholder,
}

/// One entry of a sequential diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    /// Diagram-local key: `t{n}` for tasks, `p{n}` for placeholders
    pub key: String,
    pub task_id: String,
    pub title: String,
    pub start: NaiveDate,
    pub duration_days: u32,
    /// Keys this item is scheduled after
    pub after: Vec<String>,
    pub status: PlanStatus,
}

impl PlanItem {
    pub fn end(&self) -> NaiveDate {
        add_days(self.start, self.duration_days)
    }
}

/// A resolved ordering of tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequentialPlan {
    /// Earliest creation date among scheduled tasks
    pub origin: NaiveDate,
    /// Placeholders first, then tasks with every dependency before its dependents
    pub items: Vec<PlanItem>,
    /// Dependency edges ignored because they closed a cycle
    pub ignored_cycles: usize,
}

#[derive(Debug, Clone, Copy)]
enum Dep {
    Task(usize),
    Placeholder(usize),
}

/// Drop every dependency that closes a cycle and return the remaining
/// dependency-first DAG (edges point from dependency to dependent).
///
/// Inside a strongly connected component only dependencies on a task with a
/// higher index are kept, which leaves the component acyclic.
fn acyclic_dependencies(nodes: &[&GraphNode], deps: &[Vec<Dep>]) -> (DiGraph<usize, ()>, usize) {
    let mut full: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    for i in 0..nodes.len() {
        full.add_node(i);
    }
    for (dependent, list) in deps.iter().enumerate() {
        for dep in list {
            if let Dep::Task(t) = *dep {
                full.add_edge(NodeIndex::new(t), NodeIndex::new(dependent), ());
            }
        }
    }

    let mut component = vec![0usize; nodes.len()];
    for (id, scc) in tarjan_scc(&full).into_iter().enumerate() {
        for node in scc {
            component[node.index()] = id;
        }
    }

    let mut ignored = 0;
    full.retain_edges(|g, edge| {
        let Some((dep, dependent)) = g.edge_endpoints(edge) else {
            return false;
        };
        let keep = component[dep.index()] != component[dependent.index()]
            || dep.index() > dependent.index();
        if !keep {
            tracing::warn!(
                task = %nodes[dependent.index()].id,
                dependency = %nodes[dep.index()].id,
                "ignoring cyclic dependency"
            );
            ignored += 1;
        }
        keep
    });
    (full, ignored)
}

impl SequentialPlan {
    /// Schedule every non-ghost node of a graph.
    pub fn build(graph: &GraphModel, config: &SequentialConfig) -> Self {
        let nodes: Vec<&GraphNode> = graph.nodes.iter().filter(|n| !n.is_ghost).collect();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let origin = nodes
            .iter()
            .filter_map(|n| n.created_at)
            .min()
            .map_or(DateTime::<Utc>::UNIX_EPOCH.date_naive(), |d| d.date_naive());

        let mut deps: Vec<Vec<Dep>> = vec![Vec::new(); nodes.len()];
        let mut placeholders: Vec<PlanItem> = Vec::new();
        let mut placeholder_index: HashMap<&str, usize> = HashMap::new();

        for edge in graph
            .edges
            .iter()
            .filter(|e| e.relation == RelationKind::IsDependingOn)
        {
            let Some(&source) = index.get(edge.source.as_str()) else {
                continue;
            };
            let dep = match index.get(edge.target.as_str()) {
                Some(&target) => Dep::Task(target),
                None => {
                    let p = *placeholder_index
                        .entry(edge.target.as_str())
                        .or_insert_with(|| {
                            placeholders.push(PlanItem {
                                key: format!("p{}", placeholders.len()),
                                task_id: edge.target.clone(),
                                title: format!("missing {}", edge.target),
                                start: origin,
                                duration_days: config.placeholder_duration_days,
                                after: Vec::new(),
                                status: PlanStatus::Placeholder,
                            });
                            placeholders.len() - 1
                        });
                    Dep::Placeholder(p)
                }
            };
            deps[source].push(dep);
        }

        let (dag, ignored_cycles) = acyclic_dependencies(&nodes, &deps);
        let order: Vec<usize> = match toposort(&dag, None) {
            Ok(sorted) => sorted.into_iter().map(|n| dag[n]).collect(),
            Err(cycle) => {
                tracing::warn!(node = cycle.node_id().index(), "dependency order still cyclic");
                (0..nodes.len()).collect()
            }
        };

        let mut items: Vec<Option<PlanItem>> = vec![None; nodes.len()];
        for &i in &order {
            let mut after = Vec::new();
            let mut start: Option<NaiveDate> = None;
            for dep in &deps[i] {
                let item = match *dep {
                    Dep::Placeholder(p) => &placeholders[p],
                    Dep::Task(t) => {
                        if !dag.contains_edge(NodeIndex::new(t), NodeIndex::new(i)) {
                            continue;
                        }
                        let Some(item) = items[t].as_ref() else {
                            continue;
                        };
                        item
                    }
                };
                if !after.contains(&item.key) {
                    after.push(item.key.clone());
                }
                let end = item.end();
                start = Some(start.map_or(end, |s| s.max(end)));
            }

            let node = nodes[i];
            let start = start.unwrap_or_else(|| node.created_at.map_or(origin, |d| d.date_naive()));
            items[i] = Some(PlanItem {
                key: format!("t{}", i),
                task_id: node.id.clone(),
                title: node.title.clone(),
                start,
                duration_days: parse_duration_days(node.estimated_duration.as_deref())
                    .unwrap_or(config.default_duration_days),
                after,
                status: task_status(node),
            });
        }

        let mut ordered = placeholders;
        ordered.extend(order.into_iter().filter_map(|i| items[i].take()));

        Self {
            origin,
            items: ordered,
            ignored_cycles,
        }
    }

    /// Get an item by its diagram key.
    pub fn item(&self, key: &str) -> Option<&PlanItem> {
        self.items.iter().find(|i| i.key == key)
    }

    fn placeholders(&self) -> impl Iterator<Item = &PlanItem> {
        self.items
            .iter()
            .filter(|i| i.status == PlanStatus::Placeholder)
    }

    fn tasks(&self) -> impl Iterator<Item = &PlanItem> {
        self.items
            .iter()
            .filter(|i| i.status != PlanStatus::Placeholder)
    }

    /// Render as a mermaid gantt chart.
    pub fn to_gantt(&self, config: &SequentialConfig) -> String {
        let mut out = String::new();
        out.push_str("gantt\n");
        out.push_str("    dateFormat YYYY-MM-DD\n");
        let _ = writeln!(out, "    title {}", sanitize_label(&config.title));

        let mut placeholders = self.placeholders().peekable();
        if placeholders.peek().is_some() {
            out.push_str("    section Missing dependencies\n");
            for item in placeholders {
                let _ = writeln!(
                    out,
                    "    {} :crit, {}, {}, {}d",
                    sanitize_label(&item.title),
                    item.key,
                    item.start.format("%Y-%m-%d"),
                    item.duration_days
                );
            }
        }

        out.push_str("    section Tasks\n");
        for item in self.tasks() {
            let tag = match item.status {
                PlanStatus::Done => "done, ",
                PlanStatus::Active => "active, ",
                _ => "",
            };
            let when = if item.after.is_empty() {
                item.start.format("%Y-%m-%d").to_string()
            } else {
                format!("after {}", item.after.join(" "))
            };
            let _ = writeln!(
                out,
                "    {} :{}{}, {}, {}d",
                sanitize_label(&item.title),
                tag,
                item.key,
                when,
                item.duration_days
            );
        }
        out
    }

    /// Render as a mermaid flowchart, arrows pointing from dependency to dependent.
    pub fn to_flowchart(&self, config: &SequentialConfig) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "flowchart {}", config.orientation);

        for item in &self.items {
            let class = match item.status {
                PlanStatus::Placeholder => ":::placeholder",
                PlanStatus::Done => ":::done",
                _ => "",
            };
            let _ = writeln!(
                out,
                "    {}[\"{}\"]{}",
                item.key,
                sanitize_label(&item.title),
                class
            );
        }
        for item in self.tasks() {
            for dep in &item.after {
                let _ = writeln!(out, "    {} --> {}", dep, item.key);
            }
        }

        out.push_str("    classDef placeholder stroke-dasharray: 5 5\n");
        out.push_str("    classDef done fill:#ddd\n");
        out
    }

    /// Render as a mermaid timeline grouped by start date.
    pub fn to_timeline(&self, config: &SequentialConfig) -> String {
        let mut by_date: BTreeMap<NaiveDate, Vec<&PlanItem>> = BTreeMap::new();
        for item in &self.items {
            by_date.entry(item.start).or_default().push(item);
        }

        let mut out = String::new();
        out.push_str("timeline\n");
        let _ = writeln!(out, "    title {}", sanitize_label(&config.title));
        for (date, items) in by_date {
            let titles: Vec<String> = items.iter().map(|i| sanitize_label(&i.title)).collect();
            let _ = writeln!(out, "    {} : {}", date.format("%Y-%m-%d"), titles.join(" : "));
        }
        out
    }
}

fn task_status(node: &GraphNode) -> PlanStatus {
    if node.completed_at.is_some() {
        return PlanStatus::Done;
    }
    match node.card_class {
        CardClass::Closed => PlanStatus::Done,
        CardClass::InProgress => PlanStatus::Active,
        _ => PlanStatus::Pending,
    }
}

/// Parse an estimate like `3d`, `2w` or a bare day count.
pub fn parse_duration_days(estimate: Option<&str>) -> Option<u32> {
    let s = estimate?.trim().to_lowercase();
    let (digits, factor) = if let Some(d) = s.strip_suffix('w') {
        (d, 7)
    } else if let Some(d) = s.strip_suffix('d') {
        (d, 1)
    } else {
        (s.as_str(), 1)
    };
    let n: u32 = digits.trim().parse().ok()?;
    n.checked_mul(factor).filter(|days| *days > 0)
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(date)
}

/// Strip characters that terminate a mermaid statement or label.
fn sanitize_label(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            ':' | ';' | '#' | '\n' | '\r' => ' ',
            '"' => '\'',
            c => c,
        })
        .collect();
    let trimmed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}
