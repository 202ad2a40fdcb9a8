//! Integration tests for `depviz config`.
//!
//! Precedence is CLI flag > environment > config.kdl > default; every
//! value reports where it came from.

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

fn entry<'a>(value: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    value["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["key"] == key)
        .unwrap()
}

#[test]
fn test_config_show_defaults() {
    let env = TestEnv::new();
    let output = env.depviz().args(["config", "show"]).output().unwrap();
    assert!(output.status.success());

    let value = parse_json(&output.stdout);
    assert_eq!(entry(&value, "api-url")["value"], "http://localhost:2020");
    assert_eq!(entry(&value, "api-url")["source"], "default");
    assert_eq!(entry(&value, "default-layout")["value"], "cose");
    assert_eq!(entry(&value, "token")["value"], serde_json::Value::Null);
}

#[test]
fn test_config_show_from_file() {
    let env = TestEnv::new();
    env.write_config("default-layout \"gantt\"\ntargets \"moul/depviz\"\n");
    let output = env.depviz().args(["config", "show"]).output().unwrap();
    let value = parse_json(&output.stdout);

    assert_eq!(entry(&value, "default-layout")["value"], "gantt");
    assert_eq!(entry(&value, "default-layout")["source"], "file");
    assert_eq!(entry(&value, "targets")["value"][0], "moul/depviz");
}

#[test]
fn test_config_show_env_overrides_file() {
    let env = TestEnv::new();
    env.write_config("api-url \"http://from-file:2020\"\n");
    let output = env
        .depviz()
        .args(["config", "show"])
        .env("DEPVIZ_API_URL", "http://from-env:2020")
        .env("DEPVIZ_TOKEN", "ghp_abcdefghijklmnop")
        .output()
        .unwrap();
    let value = parse_json(&output.stdout);

    assert_eq!(entry(&value, "api-url")["value"], "http://from-env:2020");
    assert_eq!(entry(&value, "api-url")["source"], "env:DEPVIZ_API_URL");
    assert_eq!(entry(&value, "token")["value"], "ghp_...mnop");
    assert_eq!(entry(&value, "token")["source"], "env:DEPVIZ_TOKEN");
}

#[test]
fn test_config_output_format_human() {
    let env = TestEnv::new();
    env.write_config("output-format \"human\"\n");
    env.depviz()
        .arg("layouts")
        .assert()
        .success()
        .stdout(predicate::str::contains("11 layouts:"));
}

#[test]
fn test_config_invalid_file() {
    let env = TestEnv::new();
    env.write_config("default-layout \"spiral\"\n");
    env.depviz()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown layout 'spiral'"));
}

#[test]
fn test_config_path() {
    let env = TestEnv::new();
    let output = env.depviz().args(["config", "path"]).output().unwrap();
    let value = parse_json(&output.stdout);
    assert_eq!(
        value["path"].as_str().unwrap(),
        env.config_path().display().to_string()
    );
    assert_eq!(value["exists"], false);
}

#[test]
fn test_config_set_writes_file() {
    let env = TestEnv::new();
    env.write_config("api-url \"http://kept:2020\"\n");
    env.depviz()
        .args(["config", "set", "default-layout", "gantt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\":\"default-layout\""));
    env.depviz()
        .args(["config", "set", "targets", "moul/depviz,moul/sgtm"])
        .assert()
        .success();

    let output = env.depviz().args(["config", "show"]).output().unwrap();
    let value = parse_json(&output.stdout);
    assert_eq!(entry(&value, "default-layout")["value"], "gantt");
    assert_eq!(entry(&value, "default-layout")["source"], "file");
    assert_eq!(entry(&value, "targets")["value"][1], "moul/sgtm");
    assert_eq!(entry(&value, "api-url")["value"], "http://kept:2020");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let env = TestEnv::new();
    env.depviz()
        .args(["config", "set", "default-layout", "spiral"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spiral"));
    env.depviz()
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));
    assert!(!env.config_path().exists());
}

#[test]
fn test_config_orientation_applies_to_flow() {
    let env = TestEnv::new();
    env.depviz()
        .args(["config", "set", "orientation", "LR"])
        .assert()
        .success();
    let input = env.sample();
    env.depviz()
        .args(["graph", "--layout", "flow", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("flowchart LR\n"));
    env.depviz()
        .args(["graph", "--layout", "flow", "--orientation", "TD", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("flowchart TD\n"));
}
