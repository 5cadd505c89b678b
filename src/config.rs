//! Runtime configuration.
//!
//! Resolved once at startup from command-line flags, then the environment,
//! then built-in defaults, and passed to the commands from there.

use std::path::PathBuf;

use thiserror::Error;

pub const CATALOG_ENV: &str = "YOUTUBE_FACES_CATALOG";
pub const IMAGES_ENV: &str = "YOUTUBE_FACES_IMAGES";
pub const EXTENSION_ENV: &str = "YOUTUBE_FACES_EXTENSION";

pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";
pub const DEFAULT_EXTENSION: &str = ".jpg";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("catalog path is empty; pass --catalog or set $YOUTUBE_FACES_CATALOG")]
    EmptyCatalogPath,
    #[error("invalid file extension '{0}'")]
    InvalidExtension(String),
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog: Option<PathBuf>,
    pub image_directory: Option<PathBuf>,
    pub extension: Option<String>,
}

/// Configuration after all sources are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Catalog file or table directory.
    pub catalog: PathBuf,
    /// Directory the image paths are relative to; empty means "as is".
    pub image_directory: PathBuf,
    /// Extension appended to image paths, including the leading dot.
    pub extension: String,
}

impl DbConfig {
    /// Resolve against the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with `lookup` standing in for the environment.
    pub fn resolve(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let catalog = overrides
            .catalog
            .or_else(|| lookup(CATALOG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        if catalog.as_os_str().is_empty() {
            return Err(ConfigError::EmptyCatalogPath);
        }

        let image_directory = overrides
            .image_directory
            .or_else(|| lookup(IMAGES_ENV).map(PathBuf::from))
            .unwrap_or_default();

        let extension = normalize_extension(
            overrides
                .extension
                .or_else(|| lookup(EXTENSION_ENV))
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        )?;

        Ok(Self {
            catalog,
            image_directory,
            extension,
        })
    }
}

/// Ensure a leading dot; an empty extension stays empty.
fn normalize_extension(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(['/', '\\']) || trimmed.trim_start_matches('.').is_empty() {
        return Err(ConfigError::InvalidExtension(raw));
    }
    if trimmed.starts_with('.') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!(".{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_flags_or_environment() {
        let config = DbConfig::resolve(ConfigOverrides::default(), env(&[])).unwrap();
        assert_eq!(config.catalog, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(config.image_directory, PathBuf::new());
        assert_eq!(config.extension, DEFAULT_EXTENSION);
    }

    #[test]
    fn flags_win_over_environment() {
        let overrides = ConfigOverrides {
            catalog: Some(PathBuf::from("/data/flag.json")),
            image_directory: None,
            extension: Some("png".into()),
        };
        let config = DbConfig::resolve(
            overrides,
            env(&[
                (CATALOG_ENV, "/data/env.json"),
                (IMAGES_ENV, "/images"),
                (EXTENSION_ENV, ".ppm"),
            ]),
        )
        .unwrap();
        assert_eq!(config.catalog, PathBuf::from("/data/flag.json"));
        assert_eq!(config.image_directory, PathBuf::from("/images"));
        assert_eq!(config.extension, ".png");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let overrides = ConfigOverrides {
            catalog: Some(PathBuf::new()),
            ..Default::default()
        };
        assert_eq!(
            DbConfig::resolve(overrides, env(&[])),
            Err(ConfigError::EmptyCatalogPath)
        );
        let overrides = ConfigOverrides {
            extension: Some("a/b".into()),
            ..Default::default()
        };
        assert!(matches!(
            DbConfig::resolve(overrides, env(&[])),
            Err(ConfigError::InvalidExtension(_))
        ));
    }
}
