//! Fetch/render cycle state.
//!
//! A [`Session`] owns the single current-graph slot. Every fetch gets a
//! generation number when it starts; a completed fetch is applied only if no
//! newer fetch was started since, so responses arriving out of order never
//! overwrite a newer graph. Layout changes reuse the cached graph and only
//! re-run layout selection. While a fetch is in flight the view stays
//! [`ViewState::Loading`].

use std::sync::Arc;

use crate::client::FetchError;
use crate::graph::{GraphFilters, GraphModel};
use crate::layout::{self, Orientation, RenderOutput};
use crate::models::Task;
use crate::{Error, Result};

/// Issued by [`Session::begin_fetch`], redeemed by [`Session::complete_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Identifies the graph a render was produced from.
///
/// Layout updates must present the handle of the current graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHandle {
    revision: u64,
}

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Nothing requested yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The graph is empty after filtering
    NoData,
    Ready(RenderOutput),
    /// The requested layout name is not recognized
    NoLayoutSelected { layout: String },
    /// The latest fetch failed; the previous render stays available
    FetchFailed {
        error: FetchError,
        last: Option<RenderOutput>,
    },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::NoData => "no_data",
            ViewState::Ready(_) => "ready",
            ViewState::NoLayoutSelected { .. } => "no_layout_selected",
            ViewState::FetchFailed { .. } => "fetch_failed",
        }
    }
}

/// Result of completing a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A newer fetch was started; the response was discarded
    Superseded,
    Failed(FetchError),
    /// The graph was rebuilt and rendered
    Rendered(RenderHandle),
}

/// State of one visualization session.
#[derive(Debug)]
pub struct Session {
    filters: GraphFilters,
    layout: String,
    orientation: Orientation,
    started: u64,
    /// Generation of the last fetch that was applied
    settled: u64,
    revision: u64,
    tasks: Option<Arc<Vec<Task>>>,
    graph: Option<Arc<GraphModel>>,
    view: ViewState,
    last_rendered: Option<RenderOutput>,
    graph_builds: usize,
}

impl Session {
    pub fn new(filters: GraphFilters, layout: impl Into<String>) -> Self {
        Self {
            filters,
            layout: layout.into(),
            orientation: Orientation::default(),
            started: 0,
            settled: 0,
            revision: 0,
            tasks: None,
            graph: None,
            view: ViewState::Idle,
            last_rendered: None,
            graph_builds: 0,
        }
    }

    /// Direction used by the flow-shaped sequential diagrams.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Start a fetch. Any fetch started earlier becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.started += 1;
        self.view = ViewState::Loading;
        tracing::debug!(generation = self.started, "fetch started");
        FetchTicket {
            generation: self.started,
        }
    }

    /// Apply the result of a fetch.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<Task>, FetchError>,
    ) -> FetchOutcome {
        if ticket.generation != self.started {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.started,
                "discarding superseded fetch"
            );
            return FetchOutcome::Superseded;
        }
        self.settled = ticket.generation;

        match result {
            Err(error) => {
                tracing::warn!(error = %error, "fetch failed");
                self.view = ViewState::FetchFailed {
                    error: error.clone(),
                    last: self.last_rendered.clone(),
                };
                FetchOutcome::Failed(error)
            }
            Ok(tasks) => {
                self.tasks = Some(Arc::new(tasks));
                self.rebuild();
                self.render();
                FetchOutcome::Rendered(self.handle())
            }
        }
    }

    /// Switch layout without rebuilding the graph.
    ///
    /// Fails with [`Error::StaleHandle`] if the graph changed since `handle`
    /// was issued, and with [`Error::UnknownLayout`] for an unrecognized name
    /// (the view then shows [`ViewState::NoLayoutSelected`]).
    pub fn update_layout(&mut self, handle: &RenderHandle, layout: &str) -> Result<RenderHandle> {
        if self.graph.is_none() || handle.revision != self.revision {
            return Err(Error::StaleHandle);
        }
        self.layout = layout.to_string();
        match self.render() {
            Some(ViewState::NoLayoutSelected { layout }) => Err(Error::UnknownLayout(layout)),
            _ => Ok(self.handle()),
        }
    }

    /// Replace the filters and rebuild from the cached task list.
    ///
    /// Returns `None` when nothing was fetched yet. Filters that change what
    /// the API returns (targets) need a new fetch to take full effect.
    pub fn set_filters(&mut self, filters: GraphFilters) -> Option<RenderHandle> {
        self.filters = filters;
        self.tasks.as_ref()?;
        self.rebuild();
        self.render();
        Some(self.handle())
    }

    fn rebuild(&mut self) {
        if let Some(tasks) = &self.tasks {
            self.graph = Some(Arc::new(GraphModel::build(tasks, &self.filters)));
            self.graph_builds += 1;
            self.revision += 1;
        }
    }

    /// Render the current graph with the current layout.
    ///
    /// The result becomes the view unless a fetch is still in flight.
    fn render(&mut self) -> Option<ViewState> {
        let graph = self.graph.as_ref()?;
        let next = match layout::select_layout(&self.layout) {
            Err(e) => {
                tracing::warn!(error = %e, "no layout selected");
                ViewState::NoLayoutSelected {
                    layout: self.layout.clone(),
                }
            }
            Ok(config) => {
                let config = config.with_orientation(self.orientation);
                let output = layout::render(graph, &config);
                if output.is_empty() {
                    self.last_rendered = None;
                    ViewState::NoData
                } else {
                    self.last_rendered = Some(output.clone());
                    ViewState::Ready(output)
                }
            }
        };
        if !self.is_fetching() {
            self.view = next.clone();
        }
        Some(next)
    }

    fn handle(&self) -> RenderHandle {
        RenderHandle {
            revision: self.revision,
        }
    }

    /// Returns true while the latest started fetch has not completed.
    pub fn is_fetching(&self) -> bool {
        self.settled < self.started
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Current graph, if any fetch succeeded.
    pub fn graph(&self) -> Option<&Arc<GraphModel>> {
        self.graph.as_ref()
    }

    pub fn filters(&self) -> &GraphFilters {
        &self.filters
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// How many times the graph pipeline ran.
    pub fn graph_builds(&self) -> usize {
        self.graph_builds
    }
}
