//! Repository targets and task ownership.
//!
//! Task ids are URL-like (`https://github.com/owner/repo/issues/42`). The
//! owning repository of a task is the `host/owner/repo` prefix of its id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host assumed for targets given as `owner/repo`.
pub const DEFAULT_HOST: &str = "github.com";

/// A repository the graph was requested for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl Target {
    /// Parse a target such as `owner/repo`, `gitlab.com/owner/repo` or a full URL.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = strip_scheme(input.trim()).trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [owner, repo] => Some(Self {
                host: DEFAULT_HOST.to_string(),
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            [host, owner, repo, ..] if host.contains('.') => Some(Self {
                host: host.to_lowercase(),
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => None,
        }
    }

    /// Parse a comma-separated target list, ignoring blank and invalid entries.
    pub fn parse_list(input: &str) -> Vec<Self> {
        input
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|s| {
                let target = Self::parse(s);
                if target.is_none() {
                    tracing::warn!(input = s, "ignoring unparseable target");
                }
                target
            })
            .collect()
    }

    /// Returns true if the task id belongs to this repository.
    pub fn owns(&self, task_id: &str) -> bool {
        owning_repository(task_id).is_some_and(|repo| &repo == self)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.repo)
    }
}

/// Extract the repository a task id belongs to.
///
/// Returns `None` for ids that are not `host/owner/repo/...` shaped.
pub fn owning_repository(task_id: &str) -> Option<Target> {
    let trimmed = strip_scheme(task_id.trim());
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [host, owner, repo, ..] if host.contains('.') => Some(Target {
            host: host.to_lowercase(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => None,
    }
}

fn strip_scheme(input: &str) -> &str {
    input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input)
}
