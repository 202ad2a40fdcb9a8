//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`DEPVIZ_API_URL` for the API URL)
//! 3. config.kdl
//! 4. Built-in defaults

use crate::Result;
use crate::config::{DepvizConfig, OutputFormat};
use crate::layout::Orientation;

/// Environment variable holding the API bearer token.
pub const TOKEN_ENV: &str = "DEPVIZ_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "DEPVIZ_API_URL";

/// Address of a locally running `depviz web` server.
pub const DEFAULT_API_URL: &str = "http://localhost:2020";

pub const DEFAULT_LAYOUT: &str = "cose";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    File,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File => write!(f, "file"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: Resolved<String>,
    pub layout: Resolved<String>,
    pub targets: Resolved<Vec<String>>,
    pub with_closed: Resolved<bool>,
    pub without_isolated: Resolved<bool>,
    pub without_prs: Resolved<bool>,
    pub without_external_deps: Resolved<bool>,
    pub output_format: Resolved<OutputFormat>,
    pub orientation: Resolved<Orientation>,
    /// Bearer token, only ever taken from the environment
    pub token: Option<Resolved<String>>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_url: Resolved::new(DEFAULT_API_URL.to_string(), ValueSource::Default),
            layout: Resolved::new(DEFAULT_LAYOUT.to_string(), ValueSource::Default),
            targets: Resolved::new(Vec::new(), ValueSource::Default),
            with_closed: Resolved::new(false, ValueSource::Default),
            without_isolated: Resolved::new(false, ValueSource::Default),
            without_prs: Resolved::new(false, ValueSource::Default),
            without_external_deps: Resolved::new(false, ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            orientation: Resolved::new(Orientation::default(), ValueSource::Default),
            token: None,
        }
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|r| r.value.as_str())
    }

    /// Get the masked token for display purposes.
    pub fn masked_token(&self) -> Option<String> {
        self.token().map(|token| {
            let chars: Vec<char> = token.chars().collect();
            if chars.len() <= 12 {
                format!("{}...", chars.iter().take(4).collect::<String>())
            } else {
                format!(
                    "{}...{}",
                    chars[..4].iter().collect::<String>(),
                    chars[chars.len() - 4..].iter().collect::<String>()
                )
            }
        })
    }
}

/// CLI overrides for configuration resolution.
///
/// Boolean flags can only switch a filter on; an absent flag defers to
/// lower precedence levels.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub layout: Option<String>,
    pub targets: Option<Vec<String>>,
    pub with_closed: Option<bool>,
    pub without_isolated: Option<bool>,
    pub without_prs: Option<bool>,
    pub without_external_deps: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub orientation: Option<Orientation>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn with_closed(mut self, value: bool) -> Self {
        self.with_closed = Some(value);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration from the process environment and config.kdl.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = super::read_config()?;
    Ok(resolve_config_with(
        &file,
        |name| std::env::var(name).ok(),
        overrides,
    ))
}

/// Resolve configuration from explicit sources.
///
/// `env` looks up an environment variable; empty values count as unset.
pub fn resolve_config_with(
    file: &DepvizConfig,
    env: impl Fn(&str) -> Option<String>,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());
    let mut result = ResolvedConfig::default();

    // Resolve api_url
    if let Some(ref url) = overrides.api_url {
        result.api_url = Resolved::new(url.clone(), ValueSource::CliFlag);
    } else if let Some(url) = env(API_URL_ENV) {
        result.api_url = Resolved::new(url, ValueSource::EnvVar(API_URL_ENV.to_string()));
    } else if let Some(ref url) = file.api_url {
        result.api_url = Resolved::new(url.clone(), ValueSource::File);
    }

    // Resolve layout
    if let Some(ref layout) = overrides.layout {
        result.layout = Resolved::new(layout.clone(), ValueSource::CliFlag);
    } else if let Some(ref layout) = file.default_layout {
        result.layout = Resolved::new(layout.clone(), ValueSource::File);
    }

    // Resolve targets
    if let Some(ref targets) = overrides.targets {
        result.targets = Resolved::new(targets.clone(), ValueSource::CliFlag);
    } else if let Some(ref targets) = file.targets {
        result.targets = Resolved::new(targets.clone(), ValueSource::File);
    }

    result.with_closed = resolve_flag(overrides.with_closed, file.with_closed);
    result.without_isolated = resolve_flag(overrides.without_isolated, file.without_isolated);
    result.without_prs = resolve_flag(overrides.without_prs, file.without_prs);
    result.without_external_deps =
        resolve_flag(overrides.without_external_deps, file.without_external_deps);

    // Resolve output_format
    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = file.output_format {
        result.output_format = Resolved::new(format, ValueSource::File);
    }

    if let Some(orientation) = overrides.orientation {
        result.orientation = Resolved::new(orientation, ValueSource::CliFlag);
    } else if let Some(orientation) = file.orientation {
        result.orientation = Resolved::new(orientation, ValueSource::File);
    }

    if let Some(token) = env(TOKEN_ENV) {
        result.token = Some(Resolved::new(
            token,
            ValueSource::EnvVar(TOKEN_ENV.to_string()),
        ));
    }

    result
}

fn resolve_flag(cli: Option<bool>, file: Option<bool>) -> Resolved<bool> {
    match (cli, file) {
        (Some(v), _) => Resolved::new(v, ValueSource::CliFlag),
        (None, Some(v)) => Resolved::new(v, ValueSource::File),
        (None, None) => Resolved::new(false, ValueSource::Default),
    }
}
