use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::expansion::{ExpandOptions, ProviderManifest};

/// Default pattern marking a file as containing expansion directives.
pub const DEFAULT_DIRECTIVE_PATTERN: &str = r"@derive\s*\(";

/// Default tag on diagnostics produced by the expander.
pub const DEFAULT_DIAGNOSTIC_SOURCE: &str = "utsushi";

/// Directories whose files are never expanded.
pub fn default_excluded_dirs() -> Vec<String> {
    vec!["node_modules".to_string(), ".git".to_string()]
}

/// Settings as written in a TOML file. Every key is optional so that a
/// project file can override only part of the user file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    pub directive_pattern: Option<String>,
    pub excluded_dirs: Option<Vec<String>>,
    pub diagnostic_source: Option<String>,
    pub expand: Option<ExpandSection>,
    #[serde(default)]
    pub providers: Vec<ProviderManifest>,
}

/// The `[expand]` table of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_annotations: Option<bool>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl From<ExpandSection> for ExpandOptions {
    fn from(section: ExpandSection) -> Self {
        Self {
            keep_annotations: section.keep_annotations.unwrap_or_default(),
            extra: section.extra,
        }
    }
}

/// Fully resolved settings for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub directive_pattern: String,
    pub excluded_dirs: Vec<String>,
    pub diagnostic_source: String,
    pub expand: ExpandOptions,
    pub providers: Vec<ProviderManifest>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directive_pattern: DEFAULT_DIRECTIVE_PATTERN.to_string(),
            excluded_dirs: default_excluded_dirs(),
            diagnostic_source: DEFAULT_DIAGNOSTIC_SOURCE.to_string(),
            expand: ExpandOptions::default(),
            providers: Vec::new(),
        }
    }
}

impl From<SettingsFile> for Settings {
    fn from(file: SettingsFile) -> Self {
        let defaults = Settings::default();
        Self {
            directive_pattern: file.directive_pattern.unwrap_or(defaults.directive_pattern),
            excluded_dirs: file.excluded_dirs.unwrap_or(defaults.excluded_dirs),
            diagnostic_source: file.diagnostic_source.unwrap_or(defaults.diagnostic_source),
            expand: file.expand.map_or(defaults.expand, ExpandOptions::from),
            providers: file.providers,
        }
    }
}

impl Settings {
    /// Compile the directive pattern.
    pub fn directive_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.directive_pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: self.directive_pattern.clone(),
            source,
        })
    }
}
