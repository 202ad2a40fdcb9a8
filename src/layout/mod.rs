//! Layout strategy selection.
//!
//! A layout name maps to one of two renderer families:
//! - **Topology**: geometric graph layouts (`circle`, `cose`, `breadthfirst`,
//!   `concentric`, `grid`, `random`, `cola`, `elk`). The configuration is
//!   handed unchanged to the external layout engine together with the
//!   `{nodes, edges}` graph.
//! - **Sequential**: dependency-ordered diagrams (`gantt`, `flow`,
//!   `timeline`). The graph is turned into a [`sequential::SequentialPlan`]
//!   and serialized as mermaid text.
//!
//! Unknown names are an error; there is no silent default layout.

pub mod sequential;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::GraphModel;
use crate::{Error, Result};
use sequential::SequentialPlan;

/// Every supported layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutName {
    Circle,
    /// Force-directed
    Cose,
    Breadthfirst,
    Concentric,
    Grid,
    Random,
    /// Constraint-based
    Cola,
    /// Hierarchical tree
    Elk,
    Gantt,
    Flow,
    Timeline,
}

impl LayoutName {
    /// Get all layout names.
    pub fn all() -> &'static [LayoutName] {
        &[
            LayoutName::Circle,
            LayoutName::Cose,
            LayoutName::Breadthfirst,
            LayoutName::Concentric,
            LayoutName::Grid,
            LayoutName::Random,
            LayoutName::Cola,
            LayoutName::Elk,
            LayoutName::Gantt,
            LayoutName::Flow,
            LayoutName::Timeline,
        ]
    }

    /// Renderer family this layout belongs to.
    pub fn family(&self) -> RendererFamily {
        match self {
            LayoutName::Gantt | LayoutName::Flow | LayoutName::Timeline => {
                RendererFamily::Sequential
            }
            _ => RendererFamily::Topology,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutName::Circle => "circle",
            LayoutName::Cose => "cose",
            LayoutName::Breadthfirst => "breadthfirst",
            LayoutName::Concentric => "concentric",
            LayoutName::Grid => "grid",
            LayoutName::Random => "random",
            LayoutName::Cola => "cola",
            LayoutName::Elk => "elk",
            LayoutName::Gantt => "gantt",
            LayoutName::Flow => "flow",
            LayoutName::Timeline => "timeline",
        }
    }

    /// Default configuration for this layout.
    pub fn config(&self) -> LayoutConfig {
        match self {
            LayoutName::Circle => LayoutConfig::Circle(CircleConfig::default()),
            LayoutName::Cose => LayoutConfig::Cose(CoseConfig::default()),
            LayoutName::Breadthfirst => LayoutConfig::Breadthfirst,
            LayoutName::Concentric => LayoutConfig::Concentric,
            LayoutName::Grid => LayoutConfig::Grid(GridConfig::default()),
            LayoutName::Random => LayoutConfig::Random,
            LayoutName::Cola => LayoutConfig::Cola(ColaConfig::default()),
            LayoutName::Elk => LayoutConfig::Elk(ElkConfig::default()),
            LayoutName::Gantt => LayoutConfig::Gantt(SequentialConfig::default()),
            LayoutName::Flow => LayoutConfig::Flow(SequentialConfig::default()),
            LayoutName::Timeline => LayoutConfig::Timeline(SequentialConfig::default()),
        }
    }
}

impl fmt::Display for LayoutName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LayoutName {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "circle" => Ok(LayoutName::Circle),
            "cose" | "force" | "force-directed" => Ok(LayoutName::Cose),
            "breadthfirst" => Ok(LayoutName::Breadthfirst),
            "concentric" => Ok(LayoutName::Concentric),
            "grid" => Ok(LayoutName::Grid),
            "random" => Ok(LayoutName::Random),
            "cola" | "constraint" => Ok(LayoutName::Cola),
            "elk" | "hierarchical" | "tree" => Ok(LayoutName::Elk),
            "gantt" => Ok(LayoutName::Gantt),
            "flow" | "sequential" => Ok(LayoutName::Flow),
            "timeline" => Ok(LayoutName::Timeline),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}

/// The two renderer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererFamily {
    /// Geometric layouts over `{nodes, edges}`
    Topology,
    /// Dependency-ordered diagram text
    Sequential,
}

impl fmt::Display for RendererFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererFamily::Topology => write!(f, "topology"),
            RendererFamily::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleConfig {
    pub avoid_overlap: bool,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self { avoid_overlap: true }
    }
}

/// Physics parameters for the force-directed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoseConfig {
    pub animate: bool,
    pub component_spacing: f64,
    pub node_overlap: f64,
    pub node_repulsion: f64,
    pub nesting_factor: f64,
    pub gravity: f64,
    pub num_iter: u32,
    pub cooling_factor: f64,
}

impl Default for CoseConfig {
    fn default() -> Self {
        Self {
            animate: false,
            component_spacing: 0.5,
            node_overlap: 2.0,
            node_repulsion: 0.5,
            nesting_factor: 19.0,
            gravity: 200.0,
            num_iter: 2000,
            cooling_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub condense: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { condense: true }
    }
}

/// Constraint-based layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColaConfig {
    pub animate: bool,
    pub refresh: u32,
    pub padding: u32,
    /// Milliseconds
    pub max_simulation_time: u32,
}

impl Default for ColaConfig {
    fn default() -> Self {
        Self {
            animate: false,
            refresh: 1,
            padding: 30,
            max_simulation_time: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElkConfig {
    pub elk: ElkOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElkOptions {
    pub zoom_to_fit: bool,
    pub algorithm: String,
    pub separate_connected_components: bool,
}

impl Default for ElkConfig {
    fn default() -> Self {
        Self {
            elk: ElkOptions {
                zoom_to_fit: true,
                algorithm: "mrtree".to_string(),
                separate_connected_components: false,
            },
        }
    }
}

/// Direction of a flow diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Top to bottom
    #[default]
    TD,
    /// Left to right
    LR,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::TD => write!(f, "TD"),
            Orientation::LR => write!(f, "LR"),
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TD" | "TB" => Ok(Orientation::TD),
            "LR" => Ok(Orientation::LR),
            _ => Err(Error::InvalidInput(format!(
                "unknown orientation '{}' (expected TD or LR)",
                s
            ))),
        }
    }
}

/// Parameters shared by the sequential layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialConfig {
    pub orientation: Orientation,
    /// Duration of tasks without a usable estimate
    pub default_duration_days: u32,
    /// Duration of synthesized entries for missing dependencies
    pub placeholder_duration_days: u32,
    pub title: String,
}

impl Default for SequentialConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::TD,
            default_duration_days: 7,
            placeholder_duration_days: 7,
            title: "depviz".to_string(),
        }
    }
}

/// Configuration handed to a renderer, discriminated by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum LayoutConfig {
    Circle(CircleConfig),
    Cose(CoseConfig),
    Breadthfirst,
    Concentric,
    Grid(GridConfig),
    Random,
    Cola(ColaConfig),
    Elk(ElkConfig),
    Gantt(SequentialConfig),
    Flow(SequentialConfig),
    Timeline(SequentialConfig),
}

impl LayoutConfig {
    pub fn name(&self) -> LayoutName {
        match self {
            LayoutConfig::Circle(_) => LayoutName::Circle,
            LayoutConfig::Cose(_) => LayoutName::Cose,
            LayoutConfig::Breadthfirst => LayoutName::Breadthfirst,
            LayoutConfig::Concentric => LayoutName::Concentric,
            LayoutConfig::Grid(_) => LayoutName::Grid,
            LayoutConfig::Random => LayoutName::Random,
            LayoutConfig::Cola(_) => LayoutName::Cola,
            LayoutConfig::Elk(_) => LayoutName::Elk,
            LayoutConfig::Gantt(_) => LayoutName::Gantt,
            LayoutConfig::Flow(_) => LayoutName::Flow,
            LayoutConfig::Timeline(_) => LayoutName::Timeline,
        }
    }

    pub fn family(&self) -> RendererFamily {
        self.name().family()
    }

    /// Set the diagram direction of a sequential layout. Topology layouts are returned as is.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        if let LayoutConfig::Gantt(c) | LayoutConfig::Flow(c) | LayoutConfig::Timeline(c) = &mut self {
            c.orientation = orientation;
        }
        self
    }

    /// Sequential parameters, if this is a sequential layout.
    pub fn sequential(&self) -> Option<&SequentialConfig> {
        match self {
            LayoutConfig::Gantt(c) | LayoutConfig::Flow(c) | LayoutConfig::Timeline(c) => Some(c),
            _ => None,
        }
    }
}

/// Map a layout name to its configuration.
///
/// Fails with [`Error::UnknownLayout`] for anything not in [`LayoutName::all`].
pub fn select_layout(name: &str) -> Result<LayoutConfig> {
    let layout: LayoutName = name.parse()?;
    tracing::debug!(layout = %layout, family = %layout.family(), "layout selected");
    Ok(layout.config())
}

/// What a renderer receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum RenderOutput {
    /// Graph plus layout configuration for a geometric renderer
    Topology {
        layout: LayoutConfig,
        graph: Arc<GraphModel>,
    },
    /// Mermaid text for a sequential renderer
    Sequential {
        layout: LayoutConfig,
        diagram: String,
    },
    /// Nothing to draw after filtering
    Empty,
}

impl RenderOutput {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderOutput::Empty)
    }
}

/// Prepare renderer input for a graph under the given layout.
pub fn render(graph: &Arc<GraphModel>, layout: &LayoutConfig) -> RenderOutput {
    if graph.is_empty() {
        return RenderOutput::Empty;
    }
    match layout.sequential() {
        None => RenderOutput::Topology {
            layout: layout.clone(),
            graph: Arc::clone(graph),
        },
        Some(config) => {
            let plan = SequentialPlan::build(graph, config);
            let diagram = match layout.name() {
                LayoutName::Gantt => plan.to_gantt(config),
                LayoutName::Timeline => plan.to_timeline(config),
                _ => plan.to_flowchart(config),
            };
            RenderOutput::Sequential {
                layout: layout.clone(),
                diagram,
            }
        }
    }
}
