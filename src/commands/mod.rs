//! Command implementations for the depviz CLI.
//!
//! Each command returns a value implementing [`Output`], which `main`
//! prints either as JSON (default) or human-readable text (`-H`).

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::cli::{GraphArgs, GraphFormat};
use crate::client::{FileTaskSource, HttpTaskSource, TaskSource};
use crate::config::{self, ConfigOverrides, DepvizConfig, ResolvedConfig, ValueSource};
use crate::graph::{BuildDiagnostics, GraphFilters, GraphModel};
use crate::layout::{LayoutName, RenderOutput, RendererFamily};
use crate::models::target::Target;
use crate::session::{FetchOutcome, Session, ViewState};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// === graph ===

/// Result of `depviz graph`.
#[derive(Debug, Clone)]
pub struct GraphResult {
    pub format: GraphFormat,
    pub source: String,
    pub graph: Arc<GraphModel>,
    pub render: RenderOutput,
}

impl GraphResult {
    pub fn is_empty(&self) -> bool {
        self.render.is_empty()
    }

    fn diagnostics(&self) -> &BuildDiagnostics {
        &self.graph.diagnostics
    }

    fn text(&self) -> Option<String> {
        match self.format {
            GraphFormat::Json => None,
            GraphFormat::Dot => Some(self.graph.to_dot()),
            GraphFormat::Mermaid => Some(match &self.render {
                RenderOutput::Sequential { diagram, .. } => diagram.clone(),
                _ => String::new(),
            }),
        }
    }
}

impl Output for GraphResult {
    fn to_json(&self) -> String {
        match self.text() {
            Some(text) => text.trim_end().to_string(),
            None => json(&self.render),
        }
    }

    fn to_human(&self) -> String {
        if let Some(text) = self.text() {
            return text.trim_end().to_string();
        }
        let d = self.diagnostics();
        let mut lines = Vec::new();
        match &self.render {
            RenderOutput::Empty => {
                lines.push(format!("No data: nothing left to draw from {}", self.source));
            }
            RenderOutput::Topology { layout, graph } => {
                lines.push(format!(
                    "{} nodes, {} edges ({} ghost) from {}",
                    graph.nodes.len(),
                    graph.edges.len(),
                    graph.ghost_count(),
                    self.source
                ));
                lines.push(format!("Layout: {} ({})", layout.name(), layout.family()));
            }
            RenderOutput::Sequential { layout, diagram } => {
                lines.push(format!(
                    "{} nodes, {} edges from {}",
                    self.graph.nodes.len(),
                    self.graph.edges.len(),
                    self.source
                ));
                lines.push(format!("Layout: {} ({})", layout.name(), layout.family()));
                lines.push(String::new());
                lines.push(diagram.trim_end().to_string());
            }
        }
        let skipped = d.invalid_records + d.malformed_references;
        if skipped > 0 {
            lines.push(format!(
                "Skipped {} invalid record(s) and {} malformed reference(s)",
                d.invalid_records, d.malformed_references
            ));
        }
        if d.filtered_nodes > 0 {
            lines.push(format!("Filtered out {} node(s)", d.filtered_nodes));
        }
        lines.join("\n")
    }
}

/// Filters from resolved config, rejecting unparseable targets.
pub fn graph_filters(config: &ResolvedConfig) -> Result<GraphFilters> {
    let targets = config
        .targets
        .value
        .iter()
        .map(|t| {
            Target::parse(t).ok_or_else(|| Error::InvalidInput(format!("invalid target: '{}'", t)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(GraphFilters {
        targets,
        with_closed: config.with_closed.value,
        without_isolated: config.without_isolated.value,
        without_prs: config.without_prs.value,
        without_external_deps: config.without_external_deps.value,
    })
}

/// Build and render a graph.
pub fn graph(args: &GraphArgs) -> Result<GraphResult> {
    let config = config::resolve_config(&args.overrides())?;
    let source: Box<dyn TaskSource> = match &args.input {
        Some(path) => Box::new(FileTaskSource::new(path)),
        None => Box::new(
            HttpTaskSource::new(config.api_url.value.clone())
                .with_token(config.token().map(str::to_string)),
        ),
    };
    graph_from_source(source.as_ref(), &config, args.format)
}

/// Build and render a graph from any task source.
pub fn graph_from_source(
    source: &dyn TaskSource,
    config: &ResolvedConfig,
    format: Option<GraphFormat>,
) -> Result<GraphResult> {
    let filters = graph_filters(config)?;
    let layout: LayoutName = config.layout.value.parse()?;
    let format = match (format, layout.family()) {
        (Some(GraphFormat::Mermaid), RendererFamily::Topology) => {
            return Err(Error::InvalidInput(format!(
                "mermaid output needs a sequential layout (gantt, flow, timeline), got '{}'",
                layout
            )));
        }
        (Some(format), _) => format,
        (None, RendererFamily::Topology) => GraphFormat::Json,
        (None, RendererFamily::Sequential) => GraphFormat::Mermaid,
    };

    let mut session = Session::new(filters, config.layout.value.clone())
        .with_orientation(config.orientation.value);
    let ticket = session.begin_fetch();
    let fetched = source.fetch(session.filters());
    if let FetchOutcome::Failed(e) = session.complete_fetch(ticket, fetched) {
        return Err(Error::Fetch(e));
    }

    let render = match session.view() {
        ViewState::Ready(output) => output.clone(),
        ViewState::NoData => RenderOutput::Empty,
        ViewState::NoLayoutSelected { layout } => return Err(Error::UnknownLayout(layout.clone())),
        other => {
            return Err(Error::InvalidInput(format!(
                "unexpected view state: {}",
                other.name()
            )));
        }
    };
    let graph = session
        .graph()
        .cloned()
        .unwrap_or_else(|| Arc::new(GraphModel::default()));

    Ok(GraphResult {
        format,
        source: source.describe(),
        graph,
        render,
    })
}

// === layouts ===

#[derive(Debug, Clone, Serialize)]
pub struct LayoutInfo {
    pub name: LayoutName,
    pub family: RendererFamily,
    pub config: crate::layout::LayoutConfig,
}

/// Result of `depviz layouts`.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutsResult {
    pub layouts: Vec<LayoutInfo>,
}

impl Output for LayoutsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} layouts:", self.layouts.len())];
        for info in &self.layouts {
            lines.push(format!("  {:<14} {}", info.name.as_str(), info.family));
        }
        lines.join("\n")
    }
}

/// List every layout.
pub fn layouts() -> LayoutsResult {
    LayoutsResult {
        layouts: LayoutName::all()
            .iter()
            .map(|&name| LayoutInfo {
                name,
                family: name.family(),
                config: name.config(),
            })
            .collect(),
    }
}

// === config ===

#[derive(Debug, Clone, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: serde_json::Value,
    pub source: String,
}

/// Result of `depviz config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigShowResult {
    pub path: Option<PathBuf>,
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match &self.path {
            Some(path) => lines.push(format!("Config file: {}", path.display())),
            None => lines.push("Config file: (none)".to_string()),
        }
        for entry in &self.entries {
            let value = match &entry.value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "(not set)".to_string(),
                other => other.to_string(),
            };
            lines.push(format!("  {:<22} {} [{}]", entry.key, value, entry.source));
        }
        lines.join("\n")
    }
}

fn entry<T: Serialize>(key: &'static str, value: &T, source: &ValueSource) -> ConfigEntry {
    ConfigEntry {
        key,
        value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        source: source.to_string(),
    }
}

/// Show the resolved configuration.
pub fn config_show() -> Result<ConfigShowResult> {
    let c = config::resolve_config(&ConfigOverrides::new())?;
    let token = match (c.masked_token(), &c.token) {
        (Some(masked), Some(resolved)) => entry("token", &masked, &resolved.source),
        _ => entry("token", &serde_json::Value::Null, &ValueSource::Default),
    };
    Ok(ConfigShowResult {
        path: config::config_kdl_path(),
        entries: vec![
            entry("api-url", &c.api_url.value, &c.api_url.source),
            entry("default-layout", &c.layout.value, &c.layout.source),
            entry("targets", &c.targets.value, &c.targets.source),
            entry("with-closed", &c.with_closed.value, &c.with_closed.source),
            entry("without-isolated", &c.without_isolated.value, &c.without_isolated.source),
            entry("without-prs", &c.without_prs.value, &c.without_prs.source),
            entry(
                "without-external-deps",
                &c.without_external_deps.value,
                &c.without_external_deps.source,
            ),
            entry("output-format", &c.output_format.value, &c.output_format.source),
            entry("orientation", &c.orientation.value, &c.orientation.source),
            token,
        ],
    })
}

/// Result of `depviz config path`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPathResult {
    pub path: Option<PathBuf>,
    pub exists: bool,
}

impl Output for ConfigPathResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.path {
            Some(path) if self.exists => path.display().to_string(),
            Some(path) => format!("{} (not created yet)", path.display()),
            None => "No config directory available".to_string(),
        }
    }
}

pub fn config_path() -> ConfigPathResult {
    let path = config::config_kdl_path();
    let exists = path.as_ref().is_some_and(|p| p.exists());
    ConfigPathResult { path, exists }
}

/// Result of `depviz config set`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// Store one setting in config.kdl, keeping the other values.
pub fn config_set(key: &str, value: &str) -> Result<ConfigSetResult> {
    let update = DepvizConfig::from_setting(key, value).map_err(Error::Config)?;
    let mut current = config::read_config()?;
    current.merge(&update);
    let path = config::write_config(&current)?;
    tracing::info!(key, path = %path.display(), "config updated");
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchError;
    use crate::config::resolve_config_with;
    use crate::models::{RelationField, Task, TaskKind, TaskState};

    struct StaticSource(std::result::Result<Vec<Task>, FetchError>);

    impl TaskSource for StaticSource {
        fn fetch(&self, _filters: &GraphFilters) -> std::result::Result<Vec<Task>, FetchError> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn resolved(overrides: ConfigOverrides) -> ResolvedConfig {
        resolve_config_with(&DepvizConfig::default(), |_| None, &overrides)
    }

    fn sample() -> Vec<Task> {
        vec![
            Task::new("A")
                .with_kind(TaskKind::Issue)
                .with_state(TaskState::Open)
                .with_relation(RelationField::IsDependingOn, &["B"]),
        ]
    }

    #[test]
    fn test_graph_topology_json() {
        let result =
            graph_from_source(&StaticSource(Ok(sample())), &resolved(ConfigOverrides::new()), None)
                .unwrap();
        assert_eq!(result.format, GraphFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(value["family"], "topology");
        assert_eq!(value["layout"]["name"], "cose");
        assert_eq!(value["graph"]["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["graph"]["nodes"][1]["is_ghost"], true);
    }

    #[test]
    fn test_graph_sequential_defaults_to_mermaid() {
        let config = resolved(ConfigOverrides::new().with_layout("gantt"));
        let result = graph_from_source(&StaticSource(Ok(sample())), &config, None).unwrap();
        assert_eq!(result.format, GraphFormat::Mermaid);
        assert!(result.to_json().starts_with("gantt\n"));
    }

    #[test]
    fn test_mermaid_needs_sequential_layout() {
        let err = graph_from_source(
            &StaticSource(Ok(sample())),
            &resolved(ConfigOverrides::new()),
            Some(GraphFormat::Mermaid),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_graph_unknown_layout() {
        let config = resolved(ConfigOverrides::new().with_layout("spiral"));
        let err = graph_from_source(&StaticSource(Ok(sample())), &config, None).unwrap_err();
        assert!(matches!(err, Error::UnknownLayout(_)));
    }

    #[test]
    fn test_graph_fetch_failure() {
        let err = graph_from_source(
            &StaticSource(Err(FetchError::Unauthorized)),
            &resolved(ConfigOverrides::new()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Unauthorized)));
    }

    #[test]
    fn test_graph_empty_is_not_an_error() {
        let result = graph_from_source(
            &StaticSource(Ok(Vec::new())),
            &resolved(ConfigOverrides::new()),
            None,
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.to_json(), r#"{"family":"empty"}"#);
        assert!(result.to_human().starts_with("No data"));
    }

    #[test]
    fn test_graph_dot_format() {
        let result = graph_from_source(
            &StaticSource(Ok(sample())),
            &resolved(ConfigOverrides::new()),
            Some(GraphFormat::Dot),
        )
        .unwrap();
        assert!(result.to_json().starts_with("digraph depviz {"));
    }

    #[test]
    fn test_invalid_target() {
        let config = resolved(ConfigOverrides::new().with_targets(vec!["nope".to_string()]));
        let err = graph_from_source(&StaticSource(Ok(sample())), &config, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_layouts_lists_all() {
        let result = layouts();
        assert_eq!(result.layouts.len(), LayoutName::all().len());
        let value: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(value["layouts"][0]["name"], "circle");
        assert_eq!(value["layouts"][0]["family"], "topology");
        assert!(result.to_human().contains("gantt"));
    }
}
