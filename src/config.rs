use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::ProcessKind;

const CONFIG_FILE_NAME: &str = ".solver-tray.json";

/// Linux reports process names from `comm`, truncated to this many bytes.
#[cfg(target_os = "linux")]
const MAX_LINUX_IMAGE_LEN: usize = 15;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Executable image names identifying each process kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImagesConfig {
    #[serde(default = "default_solver_image")]
    pub solver: String,
    #[serde(default = "default_viewer_image")]
    pub viewer: String,
}

#[cfg(target_os = "windows")]
fn default_solver_image() -> String {
    "solver.exe".to_string()
}

#[cfg(not(target_os = "windows"))]
fn default_solver_image() -> String {
    "solver".to_string()
}

#[cfg(target_os = "windows")]
fn default_viewer_image() -> String {
    "aview.exe".to_string()
}

#[cfg(not(target_os = "windows"))]
fn default_viewer_image() -> String {
    "aview".to_string()
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            solver: default_solver_image(),
            viewer: default_viewer_image(),
        }
    }
}

impl ImagesConfig {
    pub fn image_for(&self, kind: ProcessKind) -> &str {
        match kind {
            ProcessKind::Solver => &self.solver,
            ProcessKind::Viewer => &self.viewer,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        for kind in ProcessKind::ALL {
            let image = self.images.image_for(kind);
            if image.trim().is_empty() {
                bail!("image name for {} must not be empty", kind);
            }
            if image.contains('/') || image.contains('\\') {
                bail!(
                    "image name for {} must be a file name, not a path: {}",
                    kind,
                    image
                );
            }
            #[cfg(target_os = "linux")]
            if image.len() > MAX_LINUX_IMAGE_LEN {
                bail!(
                    "image name for {} is longer than {} bytes and cannot be matched: {}",
                    kind,
                    MAX_LINUX_IMAGE_LEN,
                    image
                );
            }
        }
        Ok(())
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

pub fn load_or_create_config() -> Result<Config> {
    load_or_create_config_at(&get_config_path())
}

pub fn load_and_validate_config() -> Result<Config> {
    load_and_validate_config_at(&get_config_path())
}

fn load_or_create_config_at(path: &Path) -> Result<Config> {
    if path.exists() {
        load_and_validate_config_at(path)
    } else {
        let config = Config::default();
        save_config_at(&config, path)?;
        Ok(config)
    }
}

fn load_and_validate_config_at(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).context("failed to read config file")?;
    let config =
        serde_json::from_str::<Config>(&content).context("failed to parse config file")?;
    config.validate().context("invalid config file")?;
    Ok(config)
}

fn save_config_at(config: &Config, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, content).context("failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let config: Config = serde_json::from_str(r#"{"images":{"solver":"mysolver"}}"#).unwrap();
        assert_eq!(config.images.solver, "mysolver");
        assert_eq!(config.images.viewer, default_viewer_image());
    }

    #[test]
    fn image_for_maps_each_kind() {
        let images = ImagesConfig {
            solver: "a".into(),
            viewer: "b".into(),
        };
        assert_eq!(images.image_for(ProcessKind::Solver), "a");
        assert_eq!(images.image_for(ProcessKind::Viewer), "b");
    }

    #[test]
    fn validation_rejects_empty_and_paths() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.images.viewer = "  ".into();
        assert!(config.validate().is_err());

        config.images.viewer = "bin/aview".into();
        assert!(config.validate().is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn validation_rejects_names_linux_truncates() {
        let mut config = Config::default();
        config.images.solver = "solver_parallel".into();
        assert!(config.validate().is_ok());

        config.images.solver = "solver_parallel2".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = load_or_create_config_at(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = load_and_validate_config_at(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&path, "not json").unwrap();
        assert!(load_and_validate_config_at(&path).is_err());

        fs::write(&path, r#"{"images":{"solver":""}}"#).unwrap();
        assert!(load_and_validate_config_at(&path).is_err());
    }
}
