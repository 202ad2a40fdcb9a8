//! Common test utilities for depviz integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/depviz/config.kdl`.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A small project: an epic with two parts, a dependency chain, a merge
/// request, a closed blocker and a reference to a task that was not fetched.
pub const SAMPLE_TASKS: &str = r#"{
  "tasks": [
    {
      "id": "https://github.com/moul/depviz/issues/1",
      "local_id": "moul/depviz#1",
      "kind": "Issue",
      "state": "Open",
      "title": "Epic: first release",
      "created_at": "2024-01-01T10:00:00Z",
      "has_part": ["https://github.com/moul/depviz/issues/2"]
    },
    {
      "id": "https://github.com/moul/depviz/issues/2",
      "kind": "Issue",
      "state": "Open",
      "title": "Build the graph",
      "created_at": "2024-01-02T10:00:00Z",
      "estimated_duration": "3d",
      "is_depending_on": [
        "https://github.com/moul/depviz/issues/3",
        "https://github.com/other/lib/issues/9"
      ]
    },
    {
      "id": "https://github.com/moul/depviz/issues/3",
      "kind": "Issue",
      "state": "Closed",
      "title": "Parse tasks",
      "created_at": "2024-01-01T09:00:00Z",
      "completed_at": "2024-01-03T09:00:00Z"
    },
    {
      "id": "https://github.com/moul/depviz/pull/4",
      "kind": "MergeRequest",
      "state": "Open",
      "title": "Implement graph",
      "is_related_with": ["https://github.com/moul/depviz/issues/2"]
    },
    {
      "id": "https://github.com/moul/depviz/issues/5",
      "kind": "Issue",
      "state": "Open",
      "title": "Lonely task"
    },
    { "title": "record without id or kind" }
  ]
}"#;

/// A test environment with an isolated config directory.
///
/// The `depviz()` method returns a `Command` that sets `DEPVIZ_CONFIG_DIR`
/// per-invocation and clears the other depviz variables, making tests
/// parallel-safe.
pub struct TestEnv {
    pub work_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the depviz binary with isolated configuration.
    pub fn depviz(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_depviz"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("DEPVIZ_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("DEPVIZ_API_URL");
        cmd.env_remove("DEPVIZ_TOKEN");
        cmd.env_remove("DEPVIZ_LOG");
        cmd
    }

    /// Write a task list fixture and return its path.
    pub fn write_tasks(&self, name: &str, json: &str) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    /// Write the sample fixture and return its path.
    pub fn sample(&self) -> PathBuf {
        self.write_tasks("tasks.json", SAMPLE_TASKS)
    }

    /// Write config.kdl into the isolated config directory.
    pub fn write_config(&self, kdl: &str) {
        std::fs::write(self.config_dir.path().join("config.kdl"), kdl).unwrap();
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.kdl")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap()
}
