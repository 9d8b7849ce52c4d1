//! Parser configuration
//!
//! All fields have defaults, so an empty file (or no file at all) yields the
//! default configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EpochError;
use crate::result::Result;

/// Tuning knobs for incremental reparsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Tokens relexed past an edit, and fresh statements parsed without
    /// realigning, before giving up on reuse for the rest of the text
    pub max_resync_lookahead: usize,

    /// Batches inserting more bytes than this take a full reparse
    pub max_incremental_size: usize,

    /// Reuse unaffected statements when reparsing after edits
    pub incremental: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_resync_lookahead: 64,
            max_incremental_size: 10_000,
            incremental: true,
        }
    }
}

/// Configuration file formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl ParserConfig {
    /// Load configuration from a `.toml`, `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            EpochError::config_error(format!(
                "Unsupported file extension for '{}' (expected .toml, .json, .yaml, or .yml)",
                path.display()
            ))
        })?;
        let content = fs::read_to_string(path).map_err(|e| EpochError::io_error(path, e))?;
        Self::from_str_with_format(&content, format).map_err(|e| {
            EpochError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse configuration text in the given format
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| EpochError::config_error(e.to_string()))?
            }
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| EpochError::config_error(e.to_string()))?,
            ConfigFormat::Yaml if content.trim().is_empty() => Self::default(),
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| EpochError::config_error(e.to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration in the given format
    pub fn to_string_with_format(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| EpochError::config_error(e.to_string()))
            }
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| EpochError::config_error(e.to_string())),
            ConfigFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| EpochError::config_error(e.to_string()))
            }
        }
    }

    /// Reject values that would disable resynchronisation entirely
    pub fn validate(&self) -> Result<()> {
        if self.max_resync_lookahead == 0 {
            return Err(EpochError::config_error(
                "maxResyncLookahead must be at least 1",
            ));
        }
        Ok(())
    }

    /// JSON schema describing the configuration file
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(ParserConfig);
        serde_json::to_string_pretty(&schema).map_err(|e| EpochError::config_error(e.to_string()))
    }
}
