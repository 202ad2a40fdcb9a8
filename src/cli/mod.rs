//! CLI argument definitions for depviz.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ConfigOverrides;
use crate::layout::Orientation;

/// Version with the commit and build time injected by build.rs.
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("DEPVIZ_GIT_COMMIT"),
    ", built ",
    env!("DEPVIZ_BUILD_TIMESTAMP"),
    ")"
);

/// depviz - visualize dependencies between issues, merge requests and milestones.
///
/// Start with `depviz layouts` to see the available layouts, then
/// `depviz graph --targets owner/repo` to build a graph.
#[derive(Parser, Debug)]
#[command(name = "depviz")]
#[command(author, version, about = "Build and render task dependency graphs", long_about = None)]
#[command(long_version = LONG_VERSION)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch tasks, build the dependency graph and print renderer input
    Graph(GraphArgs),

    /// List every layout with its renderer family
    Layouts,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Arguments of `depviz graph`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GraphArgs {
    /// Read a saved `{"tasks": [...]}` response instead of calling the API (`-` for stdin)
    #[arg(short, long, conflicts_with = "api")]
    pub input: Option<PathBuf>,

    /// Base URL of the graph API (also DEPVIZ_API_URL)
    #[arg(long)]
    pub api: Option<String>,

    /// Repositories to graph, comma-separated (owner/repo or host/owner/repo)
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Layout name (see `depviz layouts`)
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Keep edges towards closed or merged tasks
    #[arg(long)]
    pub with_closed: bool,

    /// Drop tasks without any relation
    #[arg(long)]
    pub without_isolated: bool,

    /// Drop merge requests
    #[arg(long)]
    pub without_prs: bool,

    /// Drop missing dependencies that belong to none of the targets
    #[arg(long)]
    pub without_external_deps: bool,

    /// Direction of flow diagrams: TD or LR
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// Graph output format (defaults to json for graph layouts, mermaid for sequential ones)
    #[arg(short, long, value_enum)]
    pub format: Option<GraphFormat>,
}

impl GraphArgs {
    /// CLI overrides for config resolution. Unset flags defer to config.kdl.
    pub fn overrides(&self) -> ConfigOverrides {
        let flag = |set: bool| set.then_some(true);
        ConfigOverrides {
            api_url: self.api.clone(),
            layout: self.layout.clone(),
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            with_closed: flag(self.with_closed),
            without_isolated: flag(self.without_isolated),
            without_prs: flag(self.without_prs),
            without_external_deps: flag(self.without_external_deps),
            output_format: None,
            orientation: self.orientation,
        }
    }
}

/// How `depviz graph` prints the render output.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// Renderer input as JSON
    Json,
    /// Mermaid diagram text (sequential layouts only)
    Mermaid,
    /// Graphviz DOT digraph
    Dot,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,

    /// Print the path of config.kdl
    Path,

    /// Store a value in config.kdl
    Set {
        /// Configuration key (e.g. default-layout, targets, without-prs)
        key: String,
        /// Configuration value
        value: String,
    },
}
