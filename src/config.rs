pub mod settings;
pub mod user;

use std::path::{Path, PathBuf};

pub use settings::{
    DEFAULT_DIAGNOSTIC_SOURCE, DEFAULT_DIRECTIVE_PATTERN, ExpandSection, Settings, SettingsFile,
    default_excluded_dirs,
};
use thiserror::Error;
pub use user::{load_settings_file, load_user_config, user_config_path};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid directive pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Merge two settings files, preferring values from `primary` over `fallback`.
pub fn merge_settings(
    fallback: Option<SettingsFile>,
    primary: Option<SettingsFile>,
) -> Option<SettingsFile> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(SettingsFile {
            directive_pattern: primary.directive_pattern.or(fallback.directive_pattern),
            excluded_dirs: primary.excluded_dirs.or(fallback.excluded_dirs),
            diagnostic_source: primary.diagnostic_source.or(fallback.diagnostic_source),
            expand: merge_expand(fallback.expand, primary.expand),
            providers: merge_providers(fallback.providers, primary.providers),
        }),
    }
}

fn merge_expand(
    fallback: Option<ExpandSection>,
    primary: Option<ExpandSection>,
) -> Option<ExpandSection> {
    match (fallback, primary) {
        (Some(mut fallback), Some(primary)) => {
            fallback.keep_annotations = primary.keep_annotations.or(fallback.keep_annotations);
            fallback.extra.extend(primary.extra);
            Some(fallback)
        }
        (fallback, primary) => primary.or(fallback),
    }
}

fn merge_providers(
    mut fallback: Vec<crate::expansion::ProviderManifest>,
    primary: Vec<crate::expansion::ProviderManifest>,
) -> Vec<crate::expansion::ProviderManifest> {
    // Primary manifests replace fallback manifests of the same name
    fallback.retain(|f| !primary.iter().any(|p| p.name == f.name));
    let mut merged = primary;
    merged.extend(fallback);
    merged
}

/// Load settings: user config merged with an optional project config, then
/// validated.
pub fn load_settings(project_config: Option<&Path>) -> Result<Settings, ConfigError> {
    let user = load_user_config()?;
    let project = project_config.map(load_settings_file).transpose()?;
    let settings = Settings::from(merge_settings(user, project).unwrap_or_default());
    settings.directive_regex()?;
    log::debug!(
        target: "utsushi::config",
        "Loaded settings: directive pattern '{}', {} provider manifest(s)",
        settings.directive_pattern,
        settings.providers.len()
    );
    Ok(settings)
}
