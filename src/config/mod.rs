//! Configuration for depviz.
//!
//! ## config.kdl - User preferences
//!
//! Located at `$DEPVIZ_CONFIG_DIR/config.kdl`, or `~/.config/depviz/config.kdl`
//! when the variable is unset. See [`schema::DepvizConfig`] for the keys.
//!
//! The API token is never read from disk; it comes from `DEPVIZ_TOKEN`.
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

use std::path::PathBuf;

use kdl::KdlDocument;

use crate::{Error, Result};

pub use resolver::{
    API_URL_ENV, ConfigOverrides, DEFAULT_API_URL, DEFAULT_LAYOUT, Resolved, ResolvedConfig,
    TOKEN_ENV, ValueSource, resolve_config, resolve_config_with,
};
pub use schema::{DepvizConfig, OutputFormat};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "DEPVIZ_CONFIG_DIR";

/// Directory holding config.kdl.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("depviz"))
}

/// Path to config.kdl, if a config directory can be determined.
pub fn config_kdl_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.kdl"))
}

/// Read config.kdl. A missing file is an empty config.
pub fn read_config() -> Result<DepvizConfig> {
    let Some(path) = config_kdl_path() else {
        return Ok(DepvizConfig::default());
    };
    if !path.exists() {
        return Ok(DepvizConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    let config = DepvizConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write config.kdl, creating the config directory if needed.
pub fn write_config(config: &DepvizConfig) -> Result<PathBuf> {
    config.validate().map_err(Error::Config)?;
    let path = config_kdl_path()
        .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, config.to_kdl().to_string())?;
    Ok(path)
}
