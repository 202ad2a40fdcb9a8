//! KDL schema for config.kdl.
//!
//! ```kdl
//! api-url "http://localhost:8000"
//! default-layout "cose"
//! targets "moul/depviz" "gitlab.com/group/project"
//! with-closed #false
//! without-isolated #true
//! without-prs #false
//! without-external-deps #false
//! output-format "human"
//! orientation "LR"
//! ```

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutName, Orientation};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// Every field is optional; unset fields fall through to the next
/// precedence level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepvizConfig {
    /// Base URL of the graph API
    pub api_url: Option<String>,

    /// Layout used when none is given on the command line
    pub default_layout: Option<String>,

    /// Repositories to fetch
    pub targets: Option<Vec<String>>,

    pub with_closed: Option<bool>,
    pub without_isolated: Option<bool>,
    pub without_prs: Option<bool>,
    pub without_external_deps: Option<bool>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Direction of sequential diagrams
    pub orientation: Option<Orientation>,
}

impl DepvizConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref layout) = self.default_layout {
            if layout.parse::<LayoutName>().is_err() {
                return Err(format!("default-layout: unknown layout '{}'", layout));
            }
        }
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("api-url must be an http(s) URL, got '{}'", url));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes and mistyped values are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            api_url: string_value(doc, "api-url"),
            default_layout: string_value(doc, "default-layout"),
            targets: doc.get("targets").map(|node| {
                node.entries()
                    .iter()
                    .filter_map(|e| e.value().as_string())
                    .map(str::to_string)
                    .collect()
            }),
            with_closed: bool_value(doc, "with-closed"),
            without_isolated: bool_value(doc, "without-isolated"),
            without_prs: bool_value(doc, "without-prs"),
            without_external_deps: bool_value(doc, "without-external-deps"),
            output_format: string_value(doc, "output-format")
                .as_deref()
                .and_then(OutputFormat::parse),
            orientation: string_value(doc, "orientation").and_then(|s| s.parse().ok()),
        }
    }

    /// Build a config holding a single `key value` setting, as typed on the command line.
    pub fn from_setting(key: &str, value: &str) -> Result<Self, String> {
        let flag = |v: &str| match v.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(format!("{}: expected true or false, got '{}'", key, v)),
        };
        let mut config = Self::default();
        match key {
            "api-url" => config.api_url = Some(value.trim().to_string()),
            "default-layout" => config.default_layout = Some(value.trim().to_string()),
            "targets" => {
                config.targets = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            "with-closed" => config.with_closed = Some(flag(value)?),
            "without-isolated" => config.without_isolated = Some(flag(value)?),
            "without-prs" => config.without_prs = Some(flag(value)?),
            "without-external-deps" => config.without_external_deps = Some(flag(value)?),
            "output-format" => {
                config.output_format = Some(OutputFormat::parse(value).ok_or_else(|| {
                    format!("output-format: expected json or human, got '{}'", value)
                })?)
            }
            "orientation" => {
                config.orientation = Some(value.parse().map_err(|e: crate::Error| e.to_string())?)
            }
            _ => return Err(format!("unknown config key '{}'", key)),
        }
        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.api_url {
            push_string(&mut doc, "api-url", url);
        }
        if let Some(ref layout) = self.default_layout {
            push_string(&mut doc, "default-layout", layout);
        }
        if let Some(ref targets) = self.targets {
            let mut node = KdlNode::new("targets");
            for target in targets {
                node.push(KdlEntry::new(KdlValue::String(target.clone())));
            }
            doc.nodes_mut().push(node);
        }
        for (name, value) in [
            ("with-closed", self.with_closed),
            ("without-isolated", self.without_isolated),
            ("without-prs", self.without_prs),
            ("without-external-deps", self.without_external_deps),
        ] {
            if let Some(value) = value {
                let mut node = KdlNode::new(name);
                node.push(KdlEntry::new(KdlValue::Bool(value)));
                doc.nodes_mut().push(node);
            }
        }
        if let Some(format) = self.output_format {
            push_string(&mut doc, "output-format", format.as_str());
        }
        if let Some(orientation) = self.orientation {
            push_string(&mut doc, "orientation", &orientation.to_string());
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &DepvizConfig) {
        if other.api_url.is_some() {
            self.api_url = other.api_url.clone();
        }
        if other.default_layout.is_some() {
            self.default_layout = other.default_layout.clone();
        }
        if other.targets.is_some() {
            self.targets = other.targets.clone();
        }
        if other.with_closed.is_some() {
            self.with_closed = other.with_closed;
        }
        if other.without_isolated.is_some() {
            self.without_isolated = other.without_isolated;
        }
        if other.without_prs.is_some() {
            self.without_prs = other.without_prs;
        }
        if other.without_external_deps.is_some() {
            self.without_external_deps = other.without_external_deps;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.orientation.is_some() {
            self.orientation = other.orientation;
        }
    }
}

fn string_value(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)?
        .entries()
        .first()?
        .value()
        .as_string()
        .map(str::to_string)
}

fn bool_value(doc: &KdlDocument, name: &str) -> Option<bool> {
    doc.get(name)?.entries().first()?.value().as_bool()
}

fn push_string(doc: &mut KdlDocument, name: &str, value: &str) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    doc.nodes_mut().push(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("human"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(DepvizConfig::from_kdl(&doc), DepvizConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            api-url "http://localhost:8000"
            default-layout "gantt"
            targets "moul/depviz" "gitlab.com/a/b"
            with-closed #true
            without-prs #false
            output-format "human"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = DepvizConfig::from_kdl(&doc);

        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.default_layout.as_deref(), Some("gantt"));
        assert_eq!(
            config.targets,
            Some(vec!["moul/depviz".to_string(), "gitlab.com/a/b".to_string()])
        );
        assert_eq!(config.with_closed, Some(true));
        assert_eq!(config.without_prs, Some(false));
        assert_eq!(config.without_isolated, None);
        assert_eq!(config.output_format, Some(OutputFormat::Human));
    }

    #[test]
    fn test_config_from_kdl_ignores_mistyped_values() {
        let kdl = r#"
            with-closed "yes"
            default-layout 3
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = DepvizConfig::from_kdl(&doc);
        assert_eq!(config.with_closed, None);
        assert_eq!(config.default_layout, None);
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = DepvizConfig {
            api_url: Some("https://depviz.example.com".to_string()),
            default_layout: Some("elk".to_string()),
            targets: Some(vec!["moul/depviz".to_string()]),
            with_closed: Some(false),
            without_isolated: Some(true),
            without_prs: None,
            without_external_deps: Some(true),
            output_format: Some(OutputFormat::Json),
            orientation: Some(Orientation::LR),
        };

        let doc = config.to_kdl();
        let parsed: KdlDocument = doc.to_string().parse().unwrap();
        assert_eq!(DepvizConfig::from_kdl(&parsed), config);
    }

    #[test]
    fn test_from_setting() {
        let config = DepvizConfig::from_setting("targets", "moul/depviz, gitlab.com/a/b,").unwrap();
        assert_eq!(
            config.targets,
            Some(vec!["moul/depviz".to_string(), "gitlab.com/a/b".to_string()])
        );
        assert_eq!(
            DepvizConfig::from_setting("without-prs", "TRUE").unwrap().without_prs,
            Some(true)
        );
        assert_eq!(
            DepvizConfig::from_setting("orientation", "lr").unwrap().orientation,
            Some(Orientation::LR)
        );
        assert!(
            DepvizConfig::from_setting("with-closed", "maybe")
                .unwrap_err()
                .contains("with-closed")
        );
        assert!(DepvizConfig::from_setting("orientation", "up").is_err());
        assert!(
            DepvizConfig::from_setting("colour", "red")
                .unwrap_err()
                .contains("unknown config key")
        );
    }

    #[test]
    fn test_config_merge() {
        let mut base = DepvizConfig {
            api_url: Some("http://a".to_string()),
            default_layout: Some("cose".to_string()),
            with_closed: Some(true),
            ..Default::default()
        };
        let other = DepvizConfig {
            default_layout: Some("grid".to_string()),
            ..Default::default()
        };

        base.merge(&other);

        assert_eq!(base.api_url.as_deref(), Some("http://a"));
        assert_eq!(base.default_layout.as_deref(), Some("grid"));
        assert_eq!(base.with_closed, Some(true));
    }

    #[test]
    fn test_validate() {
        assert!(DepvizConfig::default().validate().is_ok());

        let bad_layout = DepvizConfig {
            default_layout: Some("spiral".to_string()),
            ..Default::default()
        };
        assert!(bad_layout.validate().unwrap_err().contains("spiral"));

        let bad_url = DepvizConfig {
            api_url: Some("ftp://x".to_string()),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let alias = DepvizConfig {
            default_layout: Some("force-directed".to_string()),
            ..Default::default()
        };
        assert!(alias.validate().is_ok());
    }
}
