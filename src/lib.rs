//! depviz - task dependency graphs for issue trackers.
//!
//! This library turns a flat list of tasks (issues, merge requests,
//! milestones) with relation fields into a deduplicated graph of typed nodes
//! and directed edges, and prepares it for either a geometric graph layout
//! or a dependency-ordered diagram.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod graph;
pub mod layout;
pub mod models;
pub mod session;

pub use client::FetchError;

/// Library-level error type for depviz operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown layout: '{0}' (run `depviz layouts` to list layouts)")]
    UnknownLayout(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Render handle refers to a graph that was replaced")]
    StaleHandle,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for depviz operations.
pub type Result<T> = std::result::Result<T, Error>;
