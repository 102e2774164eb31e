//! Configuration system for yamlstamp.
//!
//! This module provides the configuration structure for the command-line
//! front end with sensible defaults and support for serialization via serde.
//! Configuration is loaded from a TOML file and merged with command-line
//! arguments.
//!
//! # Example
//!
//! ```
//! use yamlstamp::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.field_specs, vec!["metadata.annotations".to_string()]);
//! assert_eq!(config.indent_size, 2);
//!
//! // Create custom configuration
//! let custom = Config {
//!     indent_size: 4,
//!     ..Config::default()
//! };
//! ```

use crate::document::node::NodeKind;
use crate::fieldpath::FieldSpec;
use crate::setter::QuoteStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the yamlstamp command.
///
/// # Fields
///
/// * `field_specs` - Paths stamped when `--path` is not given (default: `["metadata.annotations"]`)
/// * `create_kind` - Node kind created for a missing final field (default: mapping)
/// * `quote_style` - Quotes used for ambiguous string values: "double" or "single" (default: "double")
/// * `indent_size` - Number of spaces per indentation level (default: 2)
/// * `create_backup` - Create .bak files before saving in place (default: false)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Paths stamped when none are given on the command line
    #[serde(default = "default_field_specs")]
    pub field_specs: Vec<String>,

    /// Node kind created for a missing final field
    #[serde(default = "default_create_kind")]
    pub create_kind: NodeKind,

    /// Quotes used for string values a YAML 1.1 reader would retype
    #[serde(default)]
    pub quote_style: QuoteStyle,

    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,
}

/// Returns the default path list.
fn default_field_specs() -> Vec<String> {
    vec!["metadata.annotations".to_string()]
}

fn default_create_kind() -> NodeKind {
    NodeKind::Mapping
}

/// Returns the default indentation size.
fn default_indent_size() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field_specs: default_field_specs(),
            create_kind: default_create_kind(),
            quote_style: QuoteStyle::default(),
            indent_size: default_indent_size(),
            create_backup: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlstamp/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlstamp");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't
    /// be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_else(|err| {
            log::warn!("ignoring {}: {:#}", config_path.display(), err);
            Self::default()
        })
    }

    /// Loads configuration from an explicit file, reporting any error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Saves configuration to `path`, creating its directory if needed.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Parses `field_specs`, giving each the configured creation kind.
    pub fn parsed_field_specs(&self) -> Result<Vec<FieldSpec>> {
        self.field_specs
            .iter()
            .map(|path| {
                let spec = FieldSpec::parse(path)
                    .with_context(|| format!("Invalid field spec in config: {}", path))?;
                Ok(spec.with_create(self.create_kind))
            })
            .collect()
    }
}
