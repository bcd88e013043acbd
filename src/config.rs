/// Application configuration
///
/// Read once at startup from the user's config directory:
/// - Linux: ~/.config/image-upload/config.toml
/// - macOS: ~/Library/Application Support/image-upload/config.toml
/// - Windows: %APPDATA%\image-upload\config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::capture::camera::{CameraBridge, CameraOptions, CommandCamera, UnavailableCamera};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture program and its arguments; empty means no camera
    pub command: Vec<String>,
    #[serde(flatten)]
    pub options: CameraOptions,
}

impl Config {
    /// Load the user's config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::debug!("no config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }

        match Self::from_path(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "config loaded");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Where the config file lives
    pub fn path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("image-upload");
        path.push("config.toml");
        Some(path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Build the camera bridge this config describes
    pub fn camera_bridge(&self) -> Arc<dyn CameraBridge> {
        match CommandCamera::new(&self.camera.command) {
            Some(camera) => Arc::new(camera),
            None => {
                tracing::info!("no capture command configured, camera unavailable");
                Arc::new(UnavailableCamera)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::camera::CameraDirection;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.camera.options, CameraOptions::default());
        assert!(config.camera.command.is_empty());
    }

    #[test]
    fn test_parse_camera_section() {
        let config = Config::parse(
            r#"
            [camera]
            command = ["fswebcam", "--no-banner", "{output}"]
            quality = 80
            direction = "front"
            save_to_gallery = true
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.command, vec!["fswebcam", "--no-banner", "{output}"]);
        assert_eq!(config.camera.options.quality, 80);
        assert_eq!(config.camera.options.direction, CameraDirection::Front);
        assert!(config.camera.options.save_to_gallery);
        // Untouched keys keep their defaults
        assert!(config.camera.options.correct_orientation);
        assert!(config.camera.options.allow_editing);
    }

    #[test]
    fn test_quality_out_of_range_is_clamped() {
        let config = Config::parse("[camera]\nquality = 0\n").unwrap();
        assert_eq!(config.camera.options.quality, 1);

        // An oversized quality must not cost the rest of the file
        let config = Config::parse("[camera]\ncommand = [\"snap\", \"{output}\"]\nquality = 300\n").unwrap();
        assert_eq!(config.camera.options.quality, 100);
        assert_eq!(config.camera.command, vec!["snap", "{output}"]);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(matches!(Config::parse("[camera]\nquality = \"max\"\n"), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::parse("[camera]\ndirection = \"up\"\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera]\ncommand = [\"snap\", \"{output}\"]\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.camera.command, vec!["snap", "{output}"]);
        assert!(matches!(Config::from_path(&dir.path().join("missing.toml")), Err(ConfigError::Io(_))));
    }
}
