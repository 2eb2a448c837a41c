//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/datagovhk/config.toml` (XDG user config)
//! 2. `./datagovhk.toml` (project-local)
//! 3. CLI arguments (handled externally)
//!
//! An explicit `--config <path>` replaces the discovered layers entirely.

use std::path::{Path, PathBuf};

use crate::{ConfigError, DatagovhkConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "datagovhk.toml";

/// Default config filename within XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "datagovhk";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "DATAGOVHK_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DatagovhkConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., a malformed layer was skipped).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration.
///
/// With `explicit` set, only that file is read and any failure is an error.
/// Otherwise the user config and the project-local file are layered, and a
/// malformed layer is skipped with a warning.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(explicit, None, None)
}

/// Load configuration with explicit control over the discovery directories.
///
/// `config_dir` overrides both `DATAGOVHK_CONFIG_DIR` and the platform default;
/// `project_dir` replaces the current directory for the project-local file.
pub fn load_config_with_options(
    explicit: Option<&Path>,
    config_dir: Option<&Path>,
    project_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_config_file(path)?;
        return Ok(LoadedConfig {
            config,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings: Vec::new(),
        });
    }

    let mut config = DatagovhkConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DatagovhkConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DatagovhkConfig::from_toml(&contents)
}

/// Get the XDG config file path for datagovhk.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the XDG config directory for datagovhk.
///
/// Checks `DATAGOVHK_CONFIG_DIR` env var first, then falls back to platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut DatagovhkConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/datagovhk.toml"));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_explicit_file_is_the_only_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[upstream]\ntimeout_secs = 4\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.config.upstream.timeout(), Duration::from_secs(4));
        assert_eq!(loaded.loaded_from(), vec![path.as_path()]);
    }

    #[test]
    fn test_explicit_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "not valid toml {{{{").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_project_overrides_user() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        fs::write(
            user_dir.path().join("config.toml"),
            "[client]\nready_timeout_secs = 30\nready_marker = \"up\"\n",
        )
        .unwrap();
        fs::write(
            project_dir.path().join("datagovhk.toml"),
            "[client]\nready_timeout_secs = 5\n",
        )
        .unwrap();

        let loaded =
            load_config_with_options(None, Some(user_dir.path()), Some(project_dir.path()))
                .unwrap();

        assert_eq!(loaded.config.client.ready_timeout(), Duration::from_secs(5));
        assert_eq!(loaded.config.client.ready_marker(), "up");
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_malformed_layer_warns_but_continues() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();
        fs::write(project_dir.path().join("datagovhk.toml"), "[[[").unwrap();

        let loaded =
            load_config_with_options(None, Some(user_dir.path()), Some(project_dir.path()))
                .unwrap();

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert_eq!(loaded.config, DatagovhkConfig::new());
    }
}
