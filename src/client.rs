//! Task sources for the graph pipeline.
//!
//! The graph API is queried with the same parameters the web client sends:
//! `targets` (one per repository), `withClosed`, `withoutIsolated`,
//! `withoutPrs` and `withoutExternalDeps`. Retries and token refresh are not
//! handled here; a failed fetch is reported as-is.

use std::io::Read as _;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::graph::GraphFilters;
use crate::models::{Task, parse_task_list};

/// User-Agent header sent to the graph API
const USER_AGENT: &str = concat!("depviz/", env!("CARGO_PKG_VERSION"));

/// Path of the graph endpoint below the API base URL
const GRAPH_ENDPOINT: &str = "/api/graph";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching tasks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Token missing, invalid or expired (401 Unauthorized)
    #[error("Unauthorized: the graph API returned 401, check DEPVIZ_TOKEN")]
    Unauthorized,

    /// Network or other HTTP error
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Response body was not a task list
    #[error("Failed to parse graph response: {0}")]
    Parse(String),

    /// Local input could not be read
    #[error("Failed to read input: {0}")]
    Io(String),
}

/// Something that can produce a task list for a set of filters.
pub trait TaskSource {
    /// Fetch tasks for the given filters.
    fn fetch(&self, filters: &GraphFilters) -> Result<Vec<Task>, FetchError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Fetches tasks from a depviz graph API.
#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpTaskSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send a bearer token with every request. Blank tokens are ignored.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the graph endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GRAPH_ENDPOINT)
    }

    /// Query parameters for a fetch, in request order.
    pub fn query_params(filters: &GraphFilters) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = filters
            .targets
            .iter()
            .map(|t| ("targets", t.to_string()))
            .collect();
        params.push(("withClosed", filters.with_closed.to_string()));
        params.push(("withoutIsolated", filters.without_isolated.to_string()));
        params.push(("withoutPrs", filters.without_prs.to_string()));
        params.push(("withoutExternalDeps", filters.without_external_deps.to_string()));
        params
    }
}

impl TaskSource for HttpTaskSource {
    fn fetch(&self, filters: &GraphFilters) -> Result<Vec<Task>, FetchError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let mut request = agent
            .get(&self.endpoint())
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        for (key, value) in Self::query_params(filters) {
            request = request.query(key, &value);
        }

        tracing::info!(url = %self.endpoint(), targets = filters.targets.len(), "fetching graph");
        match request.call() {
            Ok(resp) => {
                let body = resp
                    .into_string()
                    .map_err(|e| FetchError::Http(e.to_string()))?;
                parse_task_list(&body).map_err(|e| FetchError::Parse(e.to_string()))
            }
            Err(ureq::Error::Status(401, _)) => Err(FetchError::Unauthorized),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(FetchError::Http(format!("HTTP {}: {}", code, body)))
            }
            Err(e) => Err(FetchError::Http(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.endpoint()
    }
}

/// Reads a saved graph API response from disk, or stdin for `-`.
#[derive(Debug, Clone)]
pub struct FileTaskSource {
    path: PathBuf,
}

impl FileTaskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> std::io::Result<String> {
        if self.path.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        } else {
            std::fs::read_to_string(&self.path)
        }
    }
}

impl TaskSource for FileTaskSource {
    /// Filters are applied by the graph builder; a saved response is returned whole.
    fn fetch(&self, _filters: &GraphFilters) -> Result<Vec<Task>, FetchError> {
        let body = self
            .read()
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;
        parse_task_list(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::Target;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_query_params() {
        let filters = GraphFilters {
            targets: Target::parse_list("moul/depviz,gitlab.com/a/b"),
            without_prs: true,
            ..GraphFilters::default()
        };
        let params = HttpTaskSource::query_params(&filters);
        assert_eq!(
            params,
            vec![
                ("targets", "github.com/moul/depviz".to_string()),
                ("targets", "gitlab.com/a/b".to_string()),
                ("withClosed", "false".to_string()),
                ("withoutIsolated", "false".to_string()),
                ("withoutPrs", "true".to_string()),
                ("withoutExternalDeps", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let source = HttpTaskSource::new("http://localhost:8000/");
        assert_eq!(source.endpoint(), "http://localhost:8000/api/graph");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let source = HttpTaskSource::new("http://x").with_token(Some("  ".to_string()));
        assert!(source.token.is_none());
    }

    #[test]
    fn test_unreachable_api_is_http_error() {
        let source = HttpTaskSource::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2));
        let err = source.fetch(&GraphFilters::default()).unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[test]
    fn test_file_source_reads_tasks() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"tasks":[{{"id":"A","kind":"Issue"}}]}}"#).unwrap();
        let tasks = FileTaskSource::new(file.path())
            .fetch(&GraphFilters::default())
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "A");
    }

    #[test]
    fn test_file_source_missing_file() {
        let err = FileTaskSource::new("/nonexistent/depviz.json")
            .fetch(&GraphFilters::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[test]
    fn test_file_source_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = FileTaskSource::new(file.path())
            .fetch(&GraphFilters::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
