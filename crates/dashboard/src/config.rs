//! Dashboard configuration
//!
//! Configuration is read from a TOML file. Every key has a default, so a
//! missing file section (or an empty file) falls back to the layout of the
//! stock dashboard template:
//!
//! ```toml
//! time_format = "%Y%m%d%H%M%S"
//! output_extension = "xlsm"
//! macro_sheet = "macro"
//! macro_template_sheet = "macro_template"
//! search_margin = 10
//!
//! [commands]
//! label = "Commands"
//! source = "commands.csv"
//!
//! [ttl_codes]
//! label = "TTL codes"
//! source = "ttl"
//! ```

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings consumed read-only by the dashboard engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// strftime pattern for the timestamp appended to the output file name
    pub time_format: String,
    /// Extension of the produced workbook, without the dot
    pub output_extension: String,
    /// Sheet rebuilt on every run
    pub macro_sheet: String,
    /// Sheet the macro sheet is copied from
    pub macro_template_sheet: String,
    /// Rows searched for an anchor beyond the component's own row count
    pub search_margin: u32,
    pub commands: CommandsConfig,
    pub ttl_codes: TtlCodesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandsConfig {
    pub label: String,
    /// CSV file with a `name,command[,description]` header
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TtlCodesConfig {
    pub label: String,
    /// Directory of `.ttl` macro files
    pub source: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: "%Y%m%d%H%M%S".to_string(),
            output_extension: "xlsm".to_string(),
            macro_sheet: "macro".to_string(),
            macro_template_sheet: "macro_template".to_string(),
            search_margin: 10,
            commands: CommandsConfig::default(),
            ttl_codes: TtlCodesConfig::default(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            label: "Commands".to_string(),
            source: PathBuf::from("commands.csv"),
        }
    }
}

impl Default for TtlCodesConfig {
    fn default() -> Self {
        Self {
            label: "TTL codes".to_string(),
            source: PathBuf::from("ttl"),
        }
    }
}

impl Config {
    /// Load a config file; relative data sources resolve against its directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_sources(base);
        }
        config.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config text without touching the filesystem
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Anchor all relative data sources at `base`
    pub fn resolve_sources(&mut self, base: &Path) {
        for source in [&mut self.commands.source, &mut self.ttl_codes.source] {
            if source.is_relative() {
                *source = base.join(&*source);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_format.is_empty() {
            return Err(ConfigError::Invalid("time_format must not be empty".into()));
        }
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Invalid(format!(
                "time_format '{}' is not a valid strftime pattern",
                self.time_format
            )));
        }
        if self.output_extension.is_empty() || self.output_extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "output_extension '{}' must be a bare extension such as xlsm",
                self.output_extension
            )));
        }
        if self.macro_sheet.eq_ignore_ascii_case(&self.macro_template_sheet) {
            return Err(ConfigError::Invalid(format!(
                "macro_sheet and macro_template_sheet are both '{}'",
                self.macro_sheet
            )));
        }
        if self.commands.label.is_empty() || self.ttl_codes.label.is_empty() {
            return Err(ConfigError::Invalid("component labels must not be empty".into()));
        }
        Ok(())
    }
}
